// ── Polling engine ──
//
// Drives a long-running remote operation to a terminal state: probe,
// interpret, sleep a fixed interval, repeat. Failed probes are logged and
// retried after the same delay (no backoff). Waits are unbounded unless the
// policy sets an attempt cap or a deadline, and always abort promptly when
// the cancellation token fires.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Delay between scan status polls.
pub const SCAN_POLL_INTERVAL: Duration = Duration::from_secs(150);
/// Delay between report history polls.
pub const REPORT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How often to poll and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between two probes.
    pub interval: Duration,
    /// Stop after this many probes. `None` polls forever.
    pub max_attempts: Option<u32>,
    /// Stop once this much time has passed. `None` polls forever.
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    /// Unbounded polling every `interval`.
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_wait: None,
        }
    }

    pub const fn scans() -> Self {
        Self::every(SCAN_POLL_INTERVAL)
    }

    pub const fn reports() -> Self {
        Self::every(REPORT_POLL_INTERVAL)
    }

    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// What one probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// Terminal state reached; carries the value handed back to the caller.
    Done(T),
    /// Still running; carries the raw status for progress reporting.
    Pending(String),
}

/// Progress of the wait currently in flight, published for UIs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WaitState {
    #[default]
    Idle,
    Waiting {
        what: String,
        attempt: u32,
        status: Option<String>,
    },
}

/// Repeatedly run `probe` until it reports `Done`.
pub(crate) async fn poll_until<T, F, Fut>(
    what: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    progress: &watch::Sender<WaitState>,
    mut probe: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>, nexrun_api::Error>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;
    let mut last_status: Option<String> = None;

    let result = loop {
        if cancel.is_cancelled() {
            break Err(CoreError::Cancelled { what: what.into() });
        }

        attempt += 1;
        match probe().await {
            Ok(PollOutcome::Done(value)) => {
                debug!(what, attempt, "wait finished");
                break Ok(value);
            }
            Ok(PollOutcome::Pending(status)) => {
                debug!(what, attempt, %status, "still in progress");
                last_status = Some(status);
            }
            Err(e @ nexrun_api::Error::Authentication { .. }) => break Err(e.into()),
            Err(e) => warn!(what, attempt, error = %e, "status poll failed, retrying"),
        }

        progress.send_replace(WaitState::Waiting {
            what: what.into(),
            attempt,
            status: last_status.clone(),
        });

        let elapsed = started.elapsed();
        let out_of_attempts = policy.max_attempts.is_some_and(|max| attempt >= max);
        let out_of_time = policy
            .max_wait
            .is_some_and(|max| elapsed + policy.interval > max);
        if out_of_attempts || out_of_time {
            break Err(CoreError::PollExhausted {
                what: what.into(),
                attempts: attempt,
                elapsed,
                last_status,
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break Err(CoreError::Cancelled { what: what.into() }),
            () = tokio::time::sleep(policy.interval) => {}
        }
    };

    progress.send_replace(WaitState::Idle);
    result
}
