//! Bounded-retry poller for asynchronous release builds.

use std::time::Duration;

use tracing::{debug, info};

use crate::api::{BuildStatus, LearnApi};
use crate::error::ApiError;

/// How long the poller suspends between status fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How many status fetches a poller performs before giving up.
pub const POLL_ATTEMPTS: u8 = 20;

/// Waits for a release build to leave its pending states.
///
/// Deliberately simple: a fixed interval and a fixed attempt ceiling,
/// no jitter, no backoff, no wall-clock deadline. The budget is
/// decremented before the exhaustion check, so a budget of N permits
/// exactly N fetches.
#[derive(Debug, Clone, Copy)]
pub struct BuildPoller {
    pub interval: Duration,
    pub attempts: u8,
}

impl Default for BuildPoller {
    fn default() -> Self {
        BuildPoller {
            interval: POLL_INTERVAL,
            attempts: POLL_ATTEMPTS,
        }
    }
}

impl BuildPoller {
    /// Poll until the build reaches any status outside
    /// `{pending, processing}`, returning that status verbatim.
    ///
    /// The poller does not interpret terminal statuses; success versus
    /// build-side failure is the caller's reading of the returned
    /// status and errors fields. A non-2xx poll response aborts
    /// immediately regardless of remaining attempts.
    pub async fn wait_for_build<A: LearnApi + ?Sized>(
        &self,
        api: &A,
        release_id: i64,
    ) -> Result<BuildStatus, ApiError> {
        let mut remaining = self.attempts;
        if remaining == 0 {
            return Err(ApiError::RetryExhausted { attempts: 0 });
        }
        loop {
            let status = api.release_status(release_id).await?;
            if !status.is_pending() {
                info!(release_id, status = %status.status, "[POLL] build settled");
                return Ok(status);
            }

            remaining -= 1;
            if remaining == 0 {
                return Err(ApiError::RetryExhausted {
                    attempts: self.attempts,
                });
            }

            debug!(release_id, remaining, status = %status.status, "[POLL] build still pending");
            tokio::time::sleep(self.interval).await;
        }
    }
}
