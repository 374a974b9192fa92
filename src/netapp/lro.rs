//! Long-running operation tracking for Azure Resource Manager
//!
//! A mutating ARM call either completes synchronously or hands back a URL to
//! poll: `Azure-AsyncOperation` (an operation status document) or `Location`
//! (202 until done). Without either header a PUT is tracked through the
//! resource's own `provisioningState`.

use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use super::models::ProvisioningState;
use crate::error::{AnfError, Result};

/// Raw ARM response with the headers that drive polling
#[derive(Debug, Clone, Default)]
pub struct ArmResponse {
    pub status: u16,
    pub async_operation: Option<String>,
    pub location: Option<String>,
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl ArmResponse {
    pub fn from_parts(status: u16, headers: &reqwest::header::HeaderMap, body: String) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };

        Self {
            status,
            async_operation: header("azure-asyncoperation"),
            location: header("location"),
            retry_after: header("retry-after").and_then(|v| parse_retry_after(&v)),
            body,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// `Retry-After` in delta-seconds; HTTP-date values are ignored
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// How the completion of an operation is observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LroTracking {
    /// Nothing to poll
    Completed,
    AsyncOperation(String),
    Location(String),
    /// Poll the resource itself until its provisioning state is terminal
    ResourceState,
}

impl LroTracking {
    pub fn from_response(response: &ArmResponse, is_put: bool) -> Self {
        if let Some(url) = &response.async_operation {
            return LroTracking::AsyncOperation(url.clone());
        }

        if response.status == 202 {
            if let Some(url) = &response.location {
                return LroTracking::Location(url.clone());
            }
        }

        if is_put && !resource_state(&response.body).is_some_and(|s| s.is_terminal()) {
            return LroTracking::ResourceState;
        }

        LroTracking::Completed
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Done,
    Pending { retry_after: Option<Duration> },
}

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArmErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

fn describe(detail: Option<&ArmErrorDetail>, fallback: &str) -> String {
    match detail {
        Some(ArmErrorDetail {
            code: Some(code),
            message: Some(message),
        }) => format!("{code}: {message}"),
        Some(ArmErrorDetail {
            message: Some(message),
            ..
        }) => message.clone(),
        Some(ArmErrorDetail {
            code: Some(code), ..
        }) => code.clone(),
        _ => fallback.to_string(),
    }
}

/// Build an error from an ARM `{ "error": { "code", "message" } }` body
pub fn parse_azure_error(status: u16, body: &str) -> AnfError {
    #[derive(Deserialize)]
    struct Envelope {
        error: Option<ArmErrorDetail>,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(Envelope { error: Some(detail) }) => {
            AnfError::azure_api(status, describe(Some(&detail), body))
        }
        _ if body.trim().is_empty() => AnfError::azure_api(status, "no response body"),
        _ => AnfError::azure_api(status, body.trim().to_string()),
    }
}

/// Interpret an `Azure-AsyncOperation` status document
pub fn async_operation_state(response: &ArmResponse) -> Result<PollState> {
    let status: OperationStatus = serde_json::from_str(&response.body).map_err(|e| {
        AnfError::serialization(format!("Failed to parse operation status: {}", e))
    })?;

    debug!("Operation status: {}", status.status);
    match status.status.to_lowercase().as_str() {
        "succeeded" => Ok(PollState::Done),
        "failed" | "canceled" | "cancelled" => Err(AnfError::operation_failed(
            status.status.clone(),
            describe(status.error.as_ref(), "operation did not succeed"),
        )),
        _ => Ok(PollState::Pending {
            retry_after: response.retry_after,
        }),
    }
}

/// Interpret a poll of a `Location` URL
pub fn location_state(response: &ArmResponse) -> Result<PollState> {
    match response.status {
        202 => Ok(PollState::Pending {
            retry_after: response.retry_after,
        }),
        200 | 201 | 204 | 404 => Ok(PollState::Done),
        status => Err(parse_azure_error(status, &response.body)),
    }
}

fn resource_state(body: &str) -> Option<ProvisioningState> {
    let value: Value = serde_json::from_str(body).ok()?;
    let state = value.get("properties")?.get("provisioningState")?.clone();
    serde_json::from_value(state).ok()
}

/// Interpret a GET of the resource being provisioned
pub fn provisioning_state(response: &ArmResponse) -> Result<PollState> {
    match resource_state(&response.body) {
        Some(ProvisioningState::Succeeded) => Ok(PollState::Done),
        Some(state @ (ProvisioningState::Failed | ProvisioningState::Canceled)) => Err(
            AnfError::operation_failed(state.to_string(), "resource provisioning did not succeed".to_string()),
        ),
        _ => Ok(PollState::Pending {
            retry_after: response.retry_after,
        }),
    }
}

/// Call `poll` until it reports `Done`, sleeping between attempts.
///
/// `initial_delay` is the `Retry-After` of the response that started the
/// operation; the first poll waits for it.
pub async fn poll_until<F, Fut>(
    options: &PollOptions,
    what: &str,
    initial_delay: Option<Duration>,
    mut poll: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollState>>,
{
    if let Some(delay) = initial_delay {
        debug!("{} accepted, first poll in {:?}", what, delay);
        sleep(delay).await;
    }

    for attempt in 1..=options.max_attempts {
        match poll().await? {
            PollState::Done => {
                debug!("{} completed after {} poll(s)", what, attempt);
                return Ok(());
            }
            PollState::Pending { retry_after } => {
                let delay = retry_after.unwrap_or(options.interval);
                debug!("{} still running, next poll in {:?}", what, delay);
                sleep(delay).await;
            }
        }
    }

    Err(AnfError::timeout(format!(
        "{} did not complete after {} polls",
        what, options.max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn response(status: u16, body: &str) -> ArmResponse {
        ArmResponse {
            status,
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tracking_prefers_async_operation() {
        let mut resp = response(201, r#"{"properties":{"provisioningState":"Creating"}}"#);
        resp.async_operation = Some("https://op".to_string());
        resp.location = Some("https://loc".to_string());
        assert_eq!(
            LroTracking::from_response(&resp, true),
            LroTracking::AsyncOperation("https://op".to_string())
        );
    }

    #[test]
    fn test_tracking_location_only_on_202() {
        let mut resp = response(202, "");
        resp.location = Some("https://loc".to_string());
        assert_eq!(
            LroTracking::from_response(&resp, false),
            LroTracking::Location("https://loc".to_string())
        );

        let mut created = response(200, "");
        created.location = Some("https://loc".to_string());
        assert_eq!(LroTracking::from_response(&created, false), LroTracking::Completed);
    }

    #[test]
    fn test_tracking_put_without_headers() {
        let creating = response(201, r#"{"properties":{"provisioningState":"Creating"}}"#);
        assert_eq!(
            LroTracking::from_response(&creating, true),
            LroTracking::ResourceState
        );

        let done = response(200, r#"{"properties":{"provisioningState":"Succeeded"}}"#);
        assert_eq!(LroTracking::from_response(&done, true), LroTracking::Completed);
    }

    #[test]
    fn test_async_operation_states() {
        let mut running = response(200, r#"{"status":"InProgress"}"#);
        running.retry_after = Some(Duration::from_secs(3));
        assert_eq!(
            async_operation_state(&running).unwrap(),
            PollState::Pending {
                retry_after: Some(Duration::from_secs(3))
            }
        );

        let done = response(200, r#"{"status":"Succeeded"}"#);
        assert_eq!(async_operation_state(&done).unwrap(), PollState::Done);

        let failed = response(
            200,
            r#"{"status":"Failed","error":{"code":"InvalidDomainCredentials","message":"Unable to join domain"}}"#,
        );
        match async_operation_state(&failed) {
            Err(AnfError::OperationFailed { status, message }) => {
                assert_eq!(status, "Failed");
                assert_eq!(message, "InvalidDomainCredentials: Unable to join domain");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_location_states() {
        assert!(matches!(
            location_state(&response(202, "")).unwrap(),
            PollState::Pending { .. }
        ));
        assert_eq!(location_state(&response(204, "")).unwrap(), PollState::Done);
        assert!(location_state(&response(409, r#"{"error":{"message":"busy"}}"#)).is_err());
    }

    #[test]
    fn test_provisioning_state_polling() {
        let failed = response(200, r#"{"properties":{"provisioningState":"Failed"}}"#);
        assert!(matches!(
            provisioning_state(&failed),
            Err(AnfError::OperationFailed { .. })
        ));

        let updating = response(200, r#"{"properties":{"provisioningState":"Updating"}}"#);
        assert!(matches!(
            provisioning_state(&updating).unwrap(),
            PollState::Pending { .. }
        ));
    }

    #[test]
    fn test_parse_azure_error() {
        let err = parse_azure_error(
            400,
            r#"{"error":{"code":"PoolSizeTooSmall","message":"Pool size must be at least 4 TiB"}}"#,
        );
        assert_eq!(
            err.user_message(),
            "PoolSizeTooSmall: Pool size must be at least 4 TiB"
        );
        assert!(matches!(err, AnfError::AzureApiError { status: 400, .. }));

        let raw = parse_azure_error(502, "Bad Gateway");
        assert_eq!(raw.user_message(), "Bad Gateway");
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test]
    async fn test_poll_until_completes() {
        let polls = AtomicU32::new(0);
        let counter = &polls;
        let options = PollOptions {
            interval: Duration::from_millis(1),
            max_attempts: 5,
        };

        poll_until(&options, "test operation", None, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(PollState::Pending { retry_after: None })
            } else {
                Ok(PollState::Done)
            }
        })
        .await
        .unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_until_times_out() {
        let options = PollOptions {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        };

        let result = poll_until(&options, "stuck operation", None, || async {
            Ok(PollState::Pending { retry_after: None })
        })
        .await;

        match result {
            Err(AnfError::Timeout(msg)) => assert!(msg.contains("stuck operation")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_until_prefers_retry_after() {
        let polls = AtomicU32::new(0);
        let counter = &polls;
        let options = PollOptions {
            interval: Duration::from_secs(3600),
            max_attempts: 5,
        };

        let poll = poll_until(&options, "throttled operation", None, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(PollState::Pending {
                    retry_after: Some(Duration::ZERO),
                })
            } else {
                Ok(PollState::Done)
            }
        });
        tokio::time::timeout(Duration::from_secs(5), poll)
            .await
            .expect("Retry-After should replace the hour-long interval")
            .unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_until_waits_initial_delay() {
        let options = PollOptions {
            interval: Duration::from_millis(1),
            max_attempts: 1,
        };
        let started = std::time::Instant::now();

        poll_until(
            &options,
            "accepted operation",
            Some(Duration::from_millis(50)),
            || async { Ok(PollState::Done) },
        )
        .await
        .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
