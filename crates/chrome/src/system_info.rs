//! SystemInfo domain (experimental)
//!
//! Low-level information about the system the browser runs on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use socket::{Command, Result, Session};

/// A single GPU device
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuDevice {
    /// PCI ID of the vendor, 0 if unavailable
    pub vendor_id: f64,
    /// PCI ID of the device, 0 if unavailable
    pub device_id: f64,
    pub sub_sys_id: Option<f64>,
    pub revision: Option<f64>,
    pub vendor_string: String,
    pub device_string: String,
    pub driver_vendor: String,
    pub driver_version: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    /// Primary device first
    pub devices: Vec<GpuDevice>,
    pub aux_attributes: Option<Value>,
    pub feature_status: Option<Value>,
    #[serde(default)]
    pub driver_bug_workarounds: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetInfo {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInfoResult {
    pub gpu: GpuInfo,
    /// Empty if not supported
    pub model_name: String,
    /// Empty if not supported
    pub model_version: String,
    pub command_line: String,
}

impl Command for GetInfo {
    const METHOD: &'static str = "SystemInfo.getInfo";
    type Response = GetInfoResult;
}

/// Information about the system
pub async fn get_info(session: &Session) -> Result<GetInfoResult> {
    session.execute(&GetInfo {}).await
}
