//! Connect to a browser, watch layer paints, print system info
//!
//! Usage: cargo run --example system_info -- ws://localhost:9222/devtools/page/<id>

use chrome::{layer_tree, system_info, Session, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut config = SessionConfig::default();
    if let Some(url) = std::env::args().nth(1) {
        config.url = url;
    }
    println!("Connecting to {} (session {})", config.url, config.id);

    let session = Session::connect(config).await?;
    println!("Connected!");

    layer_tree::on_layer_painted(&session, |event| {
        println!("Layer {} painted: {:?}", event.layer_id, event.clip);
    });
    layer_tree::enable(&session).await?;

    let info = system_info::get_info(&session).await?;
    for device in &info.gpu.devices {
        println!("GPU: {} {} ({})", device.vendor_string, device.device_string, device.driver_version);
    }
    println!("Command line: {}", info.command_line);

    // Keep alive for a bit to see events
    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

    println!("Stats: {:?}", session.stats());
    session.close().await?;
    println!("Disconnected");

    Ok(())
}
