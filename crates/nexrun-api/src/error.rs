use thiserror::Error;

/// Top-level error type for the `nexrun-api` crate.
///
/// Covers every failure mode of a console round-trip: authentication,
/// transport, unexpected HTTP status, and body decoding.
/// `nexrun-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Console rejected the credentials (HTTP 401 or 403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// The console answered with a status outside the accepted set.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the console refused a create because the resource
    /// already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }

    /// Returns `true` if the body arrived but could not be decoded.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_api_statuses() {
        let missing = Error::Api {
            status: 404,
            message: "Not Found".into(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_conflict());

        let conflict = Error::Api {
            status: 409,
            message: "duplicate name".into(),
        };
        assert!(conflict.is_conflict());
        assert_eq!(conflict.status(), Some(409));
    }

    #[test]
    fn parse_errors_are_not_status_errors() {
        let err = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert!(err.is_parse());
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }
}
