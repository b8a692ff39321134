//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use nexrun_config::ConfigError;
use nexrun_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to console at {url}")]
    #[diagnostic(
        code(nexrun::connection_failed),
        help(
            "{reason}\n\
             Check that the console is running and reachable.\n\
             Self-signed certificates need --insecure (-k) or ca_cert in the profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Console request timed out")]
    #[diagnostic(
        code(nexrun::timeout),
        help("Increase the request timeout with --timeout or check console load.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(nexrun::auth_failed),
        help(
            "Verify the console user name and password.\n\
             Store a new password with: nexrun config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(nexrun::no_credentials),
        help(
            "Configure credentials with: nexrun config init\n\
             Or set NEXRUN_USERNAME and NEXRUN_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    #[diagnostic(code(nexrun::not_found))]
    NotFound { entity: String, identifier: String },

    // ── Console responses ────────────────────────────────────────────
    #[error("Console rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(nexrun::rejected))]
    Rejected { status: u16, message: String },

    #[error("Console answered with an unreadable body: {message}")]
    #[diagnostic(
        code(nexrun::malformed),
        help("Run with -vv to log the requests being made.")
    )]
    Malformed { message: String },

    // ── Waiting ──────────────────────────────────────────────────────
    #[error("Gave up waiting for {what} after {attempts} polls ({elapsed})")]
    #[diagnostic(
        code(nexrun::wait_exhausted),
        help("Last status seen: {last_status}. Raise --max-attempts or --max-wait to wait longer.")
    )]
    WaitExhausted {
        what: String,
        attempts: u32,
        elapsed: String,
        last_status: String,
    },

    #[error("Wait for {what} was cancelled")]
    #[diagnostic(
        code(nexrun::cancelled),
        help("The operation keeps running on the console; resume with the matching `wait` command.")
    )]
    Cancelled { what: String },

    // ── Pipeline ─────────────────────────────────────────────────────
    #[error("Report download failed: {message}")]
    #[diagnostic(code(nexrun::download_failed))]
    DownloadFailed { message: String },

    #[error("{stage} stage failed")]
    #[diagnostic(code(nexrun::stage_failed))]
    Stage {
        stage: String,
        #[source]
        source: Box<CliError>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nexrun::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(nexrun::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: nexrun config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No console configured")]
    #[diagnostic(
        code(nexrun::no_config),
        help(
            "Create a profile with: nexrun config init\n\
             Or pass --url. Config file expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(nexrun::config))]
    Config { message: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(nexrun::keyring),
        help("Set the password through NEXRUN_PASSWORD or the profile's password_env instead.")
    )]
    Keyring { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {message}")]
    #[diagnostic(code(nexrun::render))]
    Render { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout | Self::WaitExhausted { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Cancelled { .. } => exit_code::CANCELLED,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Stage { source, .. } => source.exit_code(),
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound { entity, identifier } => CliError::NotFound { entity, identifier },
            CoreError::Malformed { message } => CliError::Malformed { message },
            CoreError::Rejected { status, message } => CliError::Rejected { status, message },
            CoreError::PollExhausted {
                what,
                attempts,
                elapsed,
                last_status,
            } => CliError::WaitExhausted {
                what,
                attempts,
                elapsed: humantime::format_duration(elapsed).to_string(),
                last_status: last_status.unwrap_or_else(|| "none".into()),
            },
            CoreError::Cancelled { what } => CliError::Cancelled { what },
            CoreError::DownloadFailed { message } => CliError::DownloadFailed { message },
            CoreError::Stage { stage, source } => CliError::Stage {
                stage: stage.to_string(),
                source: Box::new(CliError::from(*source)),
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Io(e) => CliError::Io(e),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see nexrun config profiles)".into(),
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => {
                CliError::Config {
                    message: other.to_string(),
                }
            }
        }
    }
}
