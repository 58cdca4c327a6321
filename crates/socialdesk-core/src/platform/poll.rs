//! Bounded polling of remote media container status.
//!
//! Video containers (and occasionally large images) are processed
//! asynchronously by the platform. The publisher checks their status at a
//! fixed interval until they are ready, fail, or the attempt budget runs out.

use std::future::Future;
use std::time::Duration;

use socialdesk_types::error::PlatformError;

/// Fixed-interval retry budget for container status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }
}

/// Processing state of a media container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    InProgress,
    Finished,
    Published,
    Error(String),
    Expired,
}

impl ContainerStatus {
    /// Map a Graph API `status_code` (plus optional `status` detail) to a state.
    /// Unknown codes are treated as still in progress.
    pub fn from_status_code(code: &str, detail: Option<&str>) -> Self {
        match code.to_uppercase().as_str() {
            "FINISHED" => ContainerStatus::Finished,
            "PUBLISHED" => ContainerStatus::Published,
            "EXPIRED" => ContainerStatus::Expired,
            "ERROR" => ContainerStatus::Error(
                detail
                    .filter(|d| !d.is_empty())
                    .unwrap_or("container processing failed")
                    .to_string(),
            ),
            _ => ContainerStatus::InProgress,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ContainerStatus::Finished | ContainerStatus::Published)
    }
}

/// Poll `check` until the container is ready.
///
/// `check` receives the 1-based attempt number. It is invoked at most
/// `policy.max_attempts` times with `policy.interval` between calls (no sleep
/// after the last attempt). Errors returned by `check` abort polling.
pub async fn poll_until_ready<F, Fut>(
    policy: PollPolicy,
    mut check: F,
) -> Result<ContainerStatus, PlatformError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ContainerStatus, PlatformError>>,
{
    for attempt in 1..=policy.max_attempts {
        let status = check(attempt).await?;
        match status {
            ContainerStatus::Finished | ContainerStatus::Published => return Ok(status),
            ContainerStatus::Error(message) => {
                return Err(PlatformError::ContainerFailed(message));
            }
            ContainerStatus::Expired => return Err(PlatformError::ContainerExpired),
            ContainerStatus::InProgress => {
                tracing::debug!(attempt, max = policy.max_attempts, "container still processing");
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    Err(PlatformError::ContainerTimeout {
        attempts: policy.max_attempts,
    })
}
