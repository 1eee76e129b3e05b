//! Best-effort reporting of run metadata after the terminal outcome.

use std::time::Instant;

use tracing::{error, warn};

use crate::api::{LearnApi, RunBenchmark};
use crate::error::ApiError;

/// Accumulates phase durations for one command invocation.
pub struct RunTimer {
    cmd_name: String,
    started: Instant,
    release_and_build: Option<Instant>,
    release_and_build_ms: i64,
}

impl RunTimer {
    pub fn start(cmd_name: impl Into<String>) -> Self {
        RunTimer {
            cmd_name: cmd_name.into(),
            started: Instant::now(),
            release_and_build: None,
            release_and_build_ms: 0,
        }
    }

    /// Marks the start of the release-and-build phase.
    pub fn enter_release_and_build(&mut self) {
        self.release_and_build = Some(Instant::now());
    }

    /// Marks the end of the release-and-build phase.
    pub fn leave_release_and_build(&mut self) {
        if let Some(entered) = self.release_and_build.take() {
            self.release_and_build_ms = entered.elapsed().as_millis() as i64;
        }
    }

    pub fn finish(self) -> RunBenchmark {
        RunBenchmark {
            cmd_name: self.cmd_name,
            master_release_and_build: self.release_and_build_ms,
            total_cmd_time: self.started.elapsed().as_millis() as i64,
        }
    }
}

/// Send the run benchmark to Learn. Failure here never rolls back the
/// publish outcome that already happened; it surfaces as the Reporter
/// kind for the CLI to treat as a secondary failure.
pub async fn report_run<A: LearnApi + ?Sized>(
    api: &A,
    bench: RunBenchmark,
) -> Result<(), ApiError> {
    api.send_benchmark(bench).await.map_err(|e| match e {
        ApiError::Reporter(_) => e,
        other => ApiError::Reporter(other.to_string()),
    })
}

/// Fire-and-forget notification to the operational webhook, used when
/// the reporter itself fails. Reuses the invocation's shared HTTP
/// client; its own failure is only logged.
pub async fn notify_ops(http: &reqwest::Client, webhook_url: Option<&str>, message: &str) {
    let Some(url) = webhook_url else {
        warn!("[REPORT] no ops webhook configured, skipping notification");
        return;
    };

    let payload = serde_json::json!({ "text": message });
    let result = http.post(url).json(&payload).send().await;
    match result {
        Ok(response) if response.status().is_success() => {}
        Ok(response) => {
            error!(status = response.status().as_u16(), "[REPORT] ops notification rejected");
        }
        Err(e) => {
            error!(error = %e, "[REPORT] ops notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_without_release_phase_reports_zero() {
        let timer = RunTimer::start("preview");
        let bench = timer.finish();
        assert_eq!(bench.cmd_name, "preview");
        assert_eq!(bench.master_release_and_build, 0);
        assert!(bench.total_cmd_time >= 0);
    }

    #[tokio::test]
    async fn notify_ops_without_a_webhook_sends_nothing() {
        // No webhook configured: returns before any request is built.
        notify_ops(&reqwest::Client::new(), None, "secondary failure").await;
    }

    #[test]
    fn timer_captures_release_phase() {
        let mut timer = RunTimer::start("publish");
        timer.enter_release_and_build();
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.leave_release_and_build();
        let bench = timer.finish();
        assert!(bench.master_release_and_build >= 5);
        assert!(bench.total_cmd_time >= bench.master_release_and_build);
    }
}
