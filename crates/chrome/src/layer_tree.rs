//! LayerTree domain (experimental)
//!
//! Compositing layers and their paint snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use socket::{Ack, Command, Event, Result, Session};

use crate::types::Rect;

pub type LayerId = String;
pub type SnapshotId = String;

/// Rectangle where scrolling happens on the main thread
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScrollRect {
    pub rect: Rect,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Serialized fragment of a layer picture along with its offset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PictureTile {
    pub x: f64,
    pub y: f64,
    /// Base64-encoded snapshot data
    pub picture: String,
}

/// Information about a compositing layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub layer_id: LayerId,
    pub parent_layer_id: Option<LayerId>,
    pub backend_node_id: Option<i64>,
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
    pub transform: Option<Vec<f64>>,
    pub anchor_x: Option<f64>,
    pub anchor_y: Option<f64>,
    pub anchor_z: Option<f64>,
    pub paint_count: i64,
    pub draws_content: bool,
    pub invisible: Option<bool>,
    pub scroll_rects: Option<Vec<ScrollRect>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Enable {}

impl Command for Enable {
    const METHOD: &'static str = "LayerTree.enable";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct Disable {}

impl Command for Disable {
    const METHOD: &'static str = "LayerTree.disable";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositingReasonsParams {
    pub layer_id: LayerId,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositingReasonsResult {
    #[serde(default)]
    pub compositing_reasons: Vec<String>,
    #[serde(default)]
    pub compositing_reason_ids: Vec<String>,
}

impl Command for CompositingReasonsParams {
    const METHOD: &'static str = "LayerTree.compositingReasons";
    type Response = CompositingReasonsResult;
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSnapshotParams {
    pub tiles: Vec<PictureTile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSnapshotResult {
    pub snapshot_id: SnapshotId,
}

impl Command for LoadSnapshotParams {
    const METHOD: &'static str = "LayerTree.loadSnapshot";
    type Response = LoadSnapshotResult;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeSnapshotParams {
    pub layer_id: LayerId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeSnapshotResult {
    pub snapshot_id: SnapshotId,
}

impl Command for MakeSnapshotParams {
    const METHOD: &'static str = "LayerTree.makeSnapshot";
    type Response = MakeSnapshotResult;
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshotParams {
    pub snapshot_id: SnapshotId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_repeat_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_rect: Option<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileSnapshotResult {
    /// One array of per-command durations per replay
    #[serde(default)]
    pub timings: Vec<Vec<f64>>,
}

impl Command for ProfileSnapshotParams {
    const METHOD: &'static str = "LayerTree.profileSnapshot";
    type Response = ProfileSnapshotResult;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSnapshotParams {
    pub snapshot_id: SnapshotId,
}

impl Command for ReleaseSnapshotParams {
    const METHOD: &'static str = "LayerTree.releaseSnapshot";
    type Response = Ack;
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySnapshotParams {
    pub snapshot_id: SnapshotId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_step: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_step: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplaySnapshotResult {
    #[serde(rename = "dataURL")]
    pub data_url: String,
}

impl Command for ReplaySnapshotParams {
    const METHOD: &'static str = "LayerTree.replaySnapshot";
    type Response = ReplaySnapshotResult;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCommandLogParams {
    pub snapshot_id: SnapshotId,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCommandLogResult {
    #[serde(default)]
    pub command_log: Vec<Value>,
}

impl Command for SnapshotCommandLogParams {
    const METHOD: &'static str = "LayerTree.snapshotCommandLog";
    type Response = SnapshotCommandLogResult;
}

/// Fired when a layer is painted
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPaintedEvent {
    pub layer_id: LayerId,
    pub clip: Rect,
}

impl Event for LayerPaintedEvent {
    const NAME: &'static str = "LayerTree.layerPainted";
}

/// Fired when the layer tree changes. `layers` is absent when the tree
/// is no longer available.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerTreeDidChangeEvent {
    pub layers: Option<Vec<Layer>>,
}

impl Event for LayerTreeDidChangeEvent {
    const NAME: &'static str = "LayerTree.layerTreeDidChange";
}

pub async fn enable(session: &Session) -> Result<()> {
    session.execute(&Enable {}).await?;
    Ok(())
}

pub async fn disable(session: &Session) -> Result<()> {
    session.execute(&Disable {}).await?;
    Ok(())
}

/// Reasons why the given layer was composited
pub async fn compositing_reasons(
    session: &Session,
    params: &CompositingReasonsParams,
) -> Result<CompositingReasonsResult> {
    session.execute(params).await
}

pub async fn load_snapshot(
    session: &Session,
    params: &LoadSnapshotParams,
) -> Result<LoadSnapshotResult> {
    session.execute(params).await
}

pub async fn make_snapshot(
    session: &Session,
    params: &MakeSnapshotParams,
) -> Result<MakeSnapshotResult> {
    session.execute(params).await
}

pub async fn profile_snapshot(
    session: &Session,
    params: &ProfileSnapshotParams,
) -> Result<ProfileSnapshotResult> {
    session.execute(params).await
}

/// Release a snapshot captured by the back-end
pub async fn release_snapshot(session: &Session, params: &ReleaseSnapshotParams) -> Result<()> {
    session.execute(params).await?;
    Ok(())
}

/// Replay the snapshot and return the resulting bitmap as a data URL
pub async fn replay_snapshot(
    session: &Session,
    params: &ReplaySnapshotParams,
) -> Result<ReplaySnapshotResult> {
    session.execute(params).await
}

/// Replay the snapshot and return the canvas command log
pub async fn snapshot_command_log(
    session: &Session,
    params: &SnapshotCommandLogParams,
) -> Result<SnapshotCommandLogResult> {
    session.execute(params).await
}

pub fn on_layer_painted<F>(session: &Session, callback: F)
where
    F: Fn(LayerPaintedEvent) + Send + Sync + 'static,
{
    session.on::<LayerPaintedEvent, _>(callback);
}

pub fn on_layer_tree_did_change<F>(session: &Session, callback: F)
where
    F: Fn(LayerTreeDidChangeEvent) + Send + Sync + 'static,
{
    session.on::<LayerTreeDidChangeEvent, _>(callback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{answer, connect, frames_handled};
    use serde_json::json;
    use socket::SocketError;
    use std::sync::{Arc, Mutex};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_make_snapshot() {
        let (session, mut remote) = connect();

        let params = MakeSnapshotParams {
            layer_id: "17".to_string(),
        };
        let (result, command) = tokio::join!(
            make_snapshot(&session, &params),
            answer(&mut remote, json!({"snapshotId": "snap-1"}))
        );

        assert_eq!(command["method"], "LayerTree.makeSnapshot");
        assert_eq!(command["params"], json!({"layerId": "17"}));
        assert_eq!(assert_ok!(result).snapshot_id, "snap-1");
    }

    #[tokio::test]
    async fn test_replay_snapshot_omits_unset_options() {
        let (session, mut remote) = connect();

        let params = ReplaySnapshotParams {
            snapshot_id: "snap-1".to_string(),
            scale: Some(2.0),
            ..Default::default()
        };
        let (result, command) = tokio::join!(
            replay_snapshot(&session, &params),
            answer(&mut remote, json!({"dataURL": "data:image/png;base64,AAAA"}))
        );

        assert_eq!(command["params"], json!({"snapshotId": "snap-1", "scale": 2.0}));
        assert_eq!(assert_ok!(result).data_url, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_enable_accepts_empty_result() {
        let (session, mut remote) = connect();

        let (result, command) = tokio::join!(enable(&session), answer(&mut remote, json!({})));

        assert_eq!(command["method"], "LayerTree.enable");
        assert_ok!(result);
    }

    #[tokio::test]
    async fn test_remote_error_is_returned() {
        let (session, mut remote) = connect();

        let params = CompositingReasonsParams {
            layer_id: "missing".to_string(),
        };
        let call = compositing_reasons(&session, &params);
        let respond = async {
            let command = remote.next_command().await.unwrap();
            remote.push(
                json!({
                    "id": command["id"],
                    "error": {"code": -32000, "message": "No layer with given id found"}
                })
                .to_string(),
            );
        };
        let (result, _) = tokio::join!(call, respond);

        match assert_err!(result) {
            SocketError::Remote(error) => assert_eq!(error.message, "No layer with given id found"),
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_layer_tree_did_change_event() {
        let (session, remote) = connect();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        on_layer_tree_did_change(&session, move |event| {
            sink.lock().unwrap().push(event.layers.map(|layers| layers.len()));
        });

        remote.emit(
            "LayerTree.layerTreeDidChange",
            json!({
                "layers": [{
                    "layerId": "1",
                    "offsetX": 0.0,
                    "offsetY": 0.0,
                    "width": 800.0,
                    "height": 600.0,
                    "paintCount": 3,
                    "drawsContent": true
                }]
            }),
        );
        remote.emit("LayerTree.layerTreeDidChange", json!({}));
        frames_handled(&session, 2).await;

        assert_eq!(*seen.lock().unwrap(), vec![Some(1), None]);
    }

    #[tokio::test]
    async fn test_layer_painted_event() {
        let (session, remote) = connect();
        let seen = Arc::new(Mutex::new(None));

        let sink = seen.clone();
        on_layer_painted(&session, move |event| {
            *sink.lock().unwrap() = Some(event);
        });

        remote.emit(
            "LayerTree.layerPainted",
            json!({"layerId": "5", "clip": {"x": 0, "y": 0, "width": 10, "height": 20}}),
        );
        frames_handled(&session, 1).await;

        let event = seen.lock().unwrap().take().unwrap();
        assert_eq!(event.layer_id, "5");
        assert_eq!(event.clip.height, 20.0);
    }
}
