// ── Core error types ──
//
// User-facing errors from nexrun-core. Consumers never match on HTTP
// plumbing directly; the `From<nexrun_api::Error>` impl translates
// transport-layer failures into domain variants.

use std::time::Duration;

use thiserror::Error;

use crate::pipeline::Stage;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to console at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Console request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Console answered with an unreadable body: {message}")]
    Malformed { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Console rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Gave up waiting for {what} after {attempts} polls ({elapsed:?}), last status {last_status:?}")]
    PollExhausted {
        what: String,
        attempts: u32,
        elapsed: Duration,
        last_status: Option<String>,
    },

    #[error("Wait for {what} was cancelled")]
    Cancelled { what: String },

    #[error("Report download failed: {message}")]
    DownloadFailed { message: String },

    /// A pipeline stage failed or produced nothing to hand to the next one.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<CoreError>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Local I/O ────────────────────────────────────────────────────
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Wrap `self` as the failure of pipeline stage `stage`.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through stage wrappers.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nexrun_api::Error> for CoreError {
    fn from(err: nexrun_api::Error) -> Self {
        match err {
            nexrun_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            nexrun_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Rejected {
                        status: e.status().map_or(0, |s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            nexrun_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nexrun_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            nexrun_api::Error::Api {
                status: 404,
                message,
            } => CoreError::NotFound {
                entity: "Resource".into(),
                identifier: message,
            },
            nexrun_api::Error::Api { status, message } => CoreError::Rejected { status, message },
            nexrun_api::Error::Deserialization { message, body: _ } => {
                CoreError::Malformed { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_statuses_map_to_domain_variants() {
        let err: CoreError = nexrun_api::Error::Api {
            status: 404,
            message: "no such scan".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let err: CoreError = nexrun_api::Error::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Rejected { status: 500, .. }));
    }

    #[test]
    fn stage_wrapping_is_not_nested() {
        let err = CoreError::Timeout.at(Stage::Scan).at(Stage::Report);
        match &err {
            CoreError::Stage { stage, .. } => assert_eq!(*stage, Stage::Scan),
            other => panic!("expected stage error, got {other:?}"),
        }
        assert!(matches!(err.root(), CoreError::Timeout));
        assert_eq!(err.to_string(), "scan stage failed: Console request timed out");
    }
}
