//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nexrun_core::{CoreError, Lookup, PollPolicy, ResourceId, Session, WaitState};

use crate::cli::{GlobalOpts, WaitOpts};
use crate::error::CliError;

/// Parse an id given on the command line. Integers become numeric ids.
pub fn parse_id(raw: &str) -> ResourceId {
    let raw = raw.trim();
    raw.parse::<i64>()
        .map_or_else(|_| ResourceId::from(raw), ResourceId::from)
}

/// Strict view of a lookup: failures are errors, a miss is `NotFound`.
pub fn require<T>(lookup: Lookup<T>, entity: &str, identifier: &str) -> Result<T, CliError> {
    lookup
        .into_result()
        .map_err(CoreError::from)?
        .ok_or_else(|| CliError::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        })
}

/// Parse a humantime duration flag such as `90s` or `2m30s`.
pub fn parse_duration(field: &str, raw: &str) -> Result<Duration, CliError> {
    humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("'{raw}' is not a duration: {e}"),
    })
}

/// Layer `--poll-interval`, `--max-attempts` and `--max-wait` over `base`.
pub fn wait_policy(limits: &WaitOpts, base: PollPolicy) -> Result<PollPolicy, CliError> {
    limit_policy(
        base,
        limits.poll_interval.as_deref(),
        limits.max_attempts,
        limits.max_wait.as_deref(),
    )
}

/// Override the interval and, when given, the limits of `base`.
pub fn limit_policy(
    base: PollPolicy,
    interval: Option<&str>,
    max_attempts: Option<u32>,
    max_wait: Option<&str>,
) -> Result<PollPolicy, CliError> {
    let mut policy = base;
    if let Some(raw) = interval {
        policy.interval = parse_duration("poll-interval", raw)?;
    }
    if max_attempts.is_some() {
        policy = policy.with_max_attempts(max_attempts);
    }
    if let Some(raw) = max_wait {
        policy = policy.with_max_wait(Some(parse_duration("max-wait", raw)?));
    }
    Ok(policy)
}

/// Token cancelled on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling wait");
            trigger.cancel();
        }
    });
    token
}

// ── Wait spinner ────────────────────────────────────────────────────

/// Spinner on stderr that follows the session's wait progress.
///
/// Inert when stderr is not a terminal or `--quiet` is set. Cleared on drop.
pub struct WaitSpinner {
    bar: Option<ProgressBar>,
    follower: Option<JoinHandle<()>>,
}

impl WaitSpinner {
    pub fn start(session: &Session, global: &GlobalOpts) -> Self {
        if global.quiet || !std::io::stderr().is_terminal() {
            return Self {
                bar: None,
                follower: None,
            };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));

        let mut progress = session.wait_state();
        let follower_bar = bar.clone();
        let follower = tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let message = describe(&progress.borrow_and_update());
                follower_bar.set_message(message);
            }
        });

        Self {
            bar: Some(bar),
            follower: Some(follower),
        }
    }
}

impl Drop for WaitSpinner {
    fn drop(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn describe(state: &WaitState) -> String {
    match state {
        WaitState::Idle => String::new(),
        WaitState::Waiting {
            what,
            attempt,
            status,
        } => format!(
            "waiting for {what}: {} (poll {attempt})",
            status.as_deref().unwrap_or("no status yet")
        ),
    }
}
