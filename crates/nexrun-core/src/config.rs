// ── Runtime session configuration ──
//
// Describes *how* to reach a console: API root, credentials, TLS and
// timeout. Never touches disk; nexrun-config builds one and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Consoles ship with self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one console session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// API root, e.g. `https://console:3780/api/3`.
    pub api_url: Url,
    /// API user name.
    pub username: String,
    /// API user password.
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(api_url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            api_url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
