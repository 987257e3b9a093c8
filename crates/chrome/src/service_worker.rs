//! ServiceWorker domain (experimental)

use serde::{Deserialize, Serialize};
use socket::{Ack, Command, Event, Result, Session};

pub type RegistrationId = String;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWorkerRegistration {
    pub registration_id: RegistrationId,
    #[serde(rename = "scopeURL")]
    pub scope_url: String,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    New,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWorkerVersion {
    pub version_id: String,
    pub registration_id: RegistrationId,
    #[serde(rename = "scriptURL")]
    pub script_url: String,
    pub running_status: RunningStatus,
    pub status: VersionStatus,
    /// Last-Modified header value, seconds since epoch
    pub script_last_modified: Option<f64>,
    /// Time the script response was received, seconds since epoch
    pub script_response_time: Option<f64>,
    pub controlled_clients: Option<Vec<String>>,
    pub target_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWorkerErrorMessage {
    pub error_message: String,
    pub registration_id: RegistrationId,
    pub version_id: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub line_number: i64,
    pub column_number: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Enable {}

impl Command for Enable {
    const METHOD: &'static str = "ServiceWorker.enable";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct Disable {}

impl Command for Disable {
    const METHOD: &'static str = "ServiceWorker.disable";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct StopAllWorkers {}

impl Command for StopAllWorkers {
    const METHOD: &'static str = "ServiceWorker.stopAllWorkers";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverPushMessageParams {
    pub origin: String,
    pub registration_id: RegistrationId,
    pub data: String,
}

impl Command for DeliverPushMessageParams {
    const METHOD: &'static str = "ServiceWorker.deliverPushMessage";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSyncEventParams {
    pub origin: String,
    pub registration_id: RegistrationId,
    pub tag: String,
    pub last_chance: bool,
}

impl Command for DispatchSyncEventParams {
    const METHOD: &'static str = "ServiceWorker.dispatchSyncEvent";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectWorkerParams {
    pub version_id: String,
}

impl Command for InspectWorkerParams {
    const METHOD: &'static str = "ServiceWorker.inspectWorker";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetForceUpdateOnPageLoadParams {
    pub force_update_on_page_load: bool,
}

impl Command for SetForceUpdateOnPageLoadParams {
    const METHOD: &'static str = "ServiceWorker.setForceUpdateOnPageLoad";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct SkipWaitingParams {
    #[serde(rename = "scopeURL")]
    pub scope_url: String,
}

impl Command for SkipWaitingParams {
    const METHOD: &'static str = "ServiceWorker.skipWaiting";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct StartWorkerParams {
    #[serde(rename = "scopeURL")]
    pub scope_url: String,
}

impl Command for StartWorkerParams {
    const METHOD: &'static str = "ServiceWorker.startWorker";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopWorkerParams {
    pub version_id: String,
}

impl Command for StopWorkerParams {
    const METHOD: &'static str = "ServiceWorker.stopWorker";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct UnregisterParams {
    #[serde(rename = "scopeURL")]
    pub scope_url: String,
}

impl Command for UnregisterParams {
    const METHOD: &'static str = "ServiceWorker.unregister";
    type Response = Ack;
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRegistrationParams {
    #[serde(rename = "scopeURL")]
    pub scope_url: String,
}

impl Command for UpdateRegistrationParams {
    const METHOD: &'static str = "ServiceWorker.updateRegistration";
    type Response = Ack;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerErrorReportedEvent {
    pub error_message: ServiceWorkerErrorMessage,
}

impl Event for WorkerErrorReportedEvent {
    const NAME: &'static str = "ServiceWorker.workerErrorReported";
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerRegistrationUpdatedEvent {
    pub registrations: Vec<ServiceWorkerRegistration>,
}

impl Event for WorkerRegistrationUpdatedEvent {
    const NAME: &'static str = "ServiceWorker.workerRegistrationUpdated";
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerVersionUpdatedEvent {
    pub versions: Vec<ServiceWorkerVersion>,
}

impl Event for WorkerVersionUpdatedEvent {
    const NAME: &'static str = "ServiceWorker.workerVersionUpdated";
}

/// Every command in this domain answers with an empty result
async fn run<C: Command<Response = Ack>>(session: &Session, command: &C) -> Result<()> {
    session.execute(command).await?;
    Ok(())
}

pub async fn enable(session: &Session) -> Result<()> {
    run(session, &Enable {}).await
}

pub async fn disable(session: &Session) -> Result<()> {
    run(session, &Disable {}).await
}

pub async fn deliver_push_message(
    session: &Session,
    params: &DeliverPushMessageParams,
) -> Result<()> {
    run(session, params).await
}

pub async fn dispatch_sync_event(session: &Session, params: &DispatchSyncEventParams) -> Result<()> {
    run(session, params).await
}

pub async fn inspect_worker(session: &Session, params: &InspectWorkerParams) -> Result<()> {
    run(session, params).await
}

pub async fn set_force_update_on_page_load(
    session: &Session,
    params: &SetForceUpdateOnPageLoadParams,
) -> Result<()> {
    run(session, params).await
}

pub async fn skip_waiting(session: &Session, params: &SkipWaitingParams) -> Result<()> {
    run(session, params).await
}

pub async fn start_worker(session: &Session, params: &StartWorkerParams) -> Result<()> {
    run(session, params).await
}

pub async fn stop_all_workers(session: &Session) -> Result<()> {
    run(session, &StopAllWorkers {}).await
}

pub async fn stop_worker(session: &Session, params: &StopWorkerParams) -> Result<()> {
    run(session, params).await
}

pub async fn unregister(session: &Session, params: &UnregisterParams) -> Result<()> {
    run(session, params).await
}

pub async fn update_registration(
    session: &Session,
    params: &UpdateRegistrationParams,
) -> Result<()> {
    run(session, params).await
}

pub fn on_worker_error_reported<F>(session: &Session, callback: F)
where
    F: Fn(WorkerErrorReportedEvent) + Send + Sync + 'static,
{
    session.on::<WorkerErrorReportedEvent, _>(callback);
}

pub fn on_worker_registration_updated<F>(session: &Session, callback: F)
where
    F: Fn(WorkerRegistrationUpdatedEvent) + Send + Sync + 'static,
{
    session.on::<WorkerRegistrationUpdatedEvent, _>(callback);
}

pub fn on_worker_version_updated<F>(session: &Session, callback: F)
where
    F: Fn(WorkerVersionUpdatedEvent) + Send + Sync + 'static,
{
    session.on::<WorkerVersionUpdatedEvent, _>(callback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{answer, connect, frames_handled};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_scope_url_is_spelled_like_the_protocol() {
        let (session, mut remote) = connect();

        let params = StartWorkerParams {
            scope_url: "https://example.com/".to_string(),
        };
        let (result, command) =
            tokio::join!(start_worker(&session, &params), answer(&mut remote, json!({})));

        assert_ok!(result);
        assert_eq!(command["method"], "ServiceWorker.startWorker");
        assert_eq!(command["params"], json!({"scopeURL": "https://example.com/"}));
    }

    #[tokio::test]
    async fn test_dispatch_sync_event_params() {
        let (session, mut remote) = connect();

        let params = DispatchSyncEventParams {
            origin: "https://example.com".to_string(),
            registration_id: "7".to_string(),
            tag: "outbox".to_string(),
            last_chance: false,
        };
        let (result, command) = tokio::join!(
            dispatch_sync_event(&session, &params),
            answer(&mut remote, json!({}))
        );

        assert_ok!(result);
        assert_eq!(
            command["params"],
            json!({
                "origin": "https://example.com",
                "registrationId": "7",
                "tag": "outbox",
                "lastChance": false
            })
        );
    }

    #[tokio::test]
    async fn test_concurrent_commands_share_one_session() {
        let (session, mut remote) = connect();

        let remote_side = async {
            let mut methods = Vec::new();
            for _ in 0..3 {
                let command = answer(&mut remote, json!({})).await;
                methods.push(command["method"].as_str().unwrap().to_string());
            }
            methods.sort();
            methods
        };
        let (a, b, c, methods) = tokio::join!(
            enable(&session),
            stop_all_workers(&session),
            disable(&session),
            remote_side
        );

        assert_ok!(a);
        assert_ok!(b);
        assert_ok!(c);
        assert_eq!(
            methods,
            vec![
                "ServiceWorker.disable",
                "ServiceWorker.enable",
                "ServiceWorker.stopAllWorkers"
            ]
        );
    }

    #[tokio::test]
    async fn test_worker_version_updated_event() {
        let (session, remote) = connect();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        on_worker_version_updated(&session, move |event| {
            sink.lock().unwrap().extend(event.versions);
        });

        remote.emit(
            "ServiceWorker.workerVersionUpdated",
            json!({
                "versions": [{
                    "versionId": "3",
                    "registrationId": "1",
                    "scriptURL": "https://example.com/sw.js",
                    "runningStatus": "running",
                    "status": "activated",
                    "controlledClients": ["target-1"]
                }]
            }),
        );
        frames_handled(&session, 1).await;

        let versions = seen.lock().unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].running_status, RunningStatus::Running);
        assert_eq!(versions[0].status, VersionStatus::Activated);
        assert_eq!(versions[0].script_last_modified, None);
    }

    #[tokio::test]
    async fn test_two_subscribers_both_see_the_error_report() {
        let (session, remote) = connect();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second"] {
            let sink = seen.clone();
            on_worker_error_reported(&session, move |event| {
                sink.lock()
                    .unwrap()
                    .push(format!("{}:{}", label, event.error_message.line_number));
            });
        }

        remote.emit(
            "ServiceWorker.workerErrorReported",
            json!({
                "errorMessage": {
                    "errorMessage": "Uncaught TypeError",
                    "registrationId": "1",
                    "versionId": "3",
                    "sourceURL": "https://example.com/sw.js",
                    "lineNumber": 12,
                    "columnNumber": 4
                }
            }),
        );
        frames_handled(&session, 1).await;

        assert_eq!(*seen.lock().unwrap(), vec!["first:12", "second:12"]);
    }
}
