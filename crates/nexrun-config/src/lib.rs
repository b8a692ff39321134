//! Configuration for the nexrun CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation into `nexrun_core::SessionConfig` and `PipelineOptions`.
//! The CLI layers its global flags on top of what is resolved here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use nexrun_core::{PipelineOptions, PollPolicy, SessionConfig, TlsVerification};

/// Keyring service name passwords are stored under.
pub const KEYRING_SERVICE: &str = "nexrun";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named console profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named console profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Console URL. A bare host (`https://console:3780`) gets `/api/3`
    /// appended.
    pub url: String,

    /// API user name.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification. Defaults to on: consoles ship self-signed.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    // ── Pipeline settings ───────────────────────────────────────────
    /// Scan template given to newly created sites.
    pub scan_template_id: Option<String>,

    /// Description given to newly created sites.
    pub description: Option<String>,

    /// Report format (`pdf`, `html`, ...).
    pub report_format: Option<String>,

    /// Report template id.
    pub report_template: Option<String>,

    /// File name of downloaded reports.
    pub save_filename: Option<String>,

    /// Root directory downloads are written under.
    pub output_dir: Option<PathBuf>,

    /// Seconds between scan status polls.
    pub scan_poll_interval: Option<u64>,

    /// Seconds between report status polls.
    pub report_poll_interval: Option<u64>,

    /// Give up a wait after this many polls.
    pub max_poll_attempts: Option<u32>,

    /// Give up a wait after this many seconds.
    pub max_wait: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "nexrun", "nexrun").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nexrun");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// Environment keys use `__` for nesting, e.g.
/// `NEXRUN_DEFAULTS__TIMEOUT=60` or `NEXRUN_PROFILES__LAB__URL=...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEXRUN_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the API user and password.
///
/// Password order: the profile's `password_env` variable,
/// `NEXRUN_PASSWORD`, the system keyring, then plaintext in the profile.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("NEXRUN_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Profile-named env var
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var("NEXRUN_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    // 3. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Translation into core types ─────────────────────────────────────

/// Parse a console URL, appending `/api/3` to a bare host.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url: Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if url.path().trim_matches('/').is_empty() {
        url.set_path("/api/3");
    }
    Ok(url)
}

/// TLS strategy for a profile. A CA certificate implies verification.
pub fn profile_tls(profile: &Profile) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca_path)) => TlsVerification::CustomCa(ca_path.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        (None, None) => TlsVerification::DangerAcceptInvalid,
    }
}

/// Build a `SessionConfig` from a profile, no CLI flag overrides.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<SessionConfig, ConfigError> {
    let api_url = parse_api_url(&profile.url)?;
    let (username, password) = resolve_credentials(profile, profile_name)?;

    Ok(SessionConfig {
        api_url,
        username,
        password,
        tls: profile_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
    })
}

/// Build `PipelineOptions` from a profile, falling back to the stock
/// defaults for anything unset.
pub fn profile_to_pipeline_options(profile: &Profile) -> PipelineOptions {
    let defaults = PipelineOptions::default();

    let policy = |interval: Option<u64>, fallback: PollPolicy| {
        interval
            .map_or(fallback, |secs| PollPolicy::every(Duration::from_secs(secs)))
            .with_max_attempts(profile.max_poll_attempts)
            .with_max_wait(profile.max_wait.map(Duration::from_secs))
    };

    PipelineOptions {
        description: profile.description.clone().unwrap_or(defaults.description),
        scan_template_id: profile
            .scan_template_id
            .clone()
            .unwrap_or(defaults.scan_template_id),
        report_format: profile.report_format.clone().unwrap_or(defaults.report_format),
        report_template: profile
            .report_template
            .clone()
            .unwrap_or(defaults.report_template),
        save_filename: profile.save_filename.clone().unwrap_or(defaults.save_filename),
        scan_policy: policy(profile.scan_poll_interval, defaults.scan_policy),
        report_policy: policy(profile.report_poll_interval, defaults.report_policy),
        title_case: defaults.title_case,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
        default_profile = "lab"

        [defaults]
        output = "json"

        [profiles.lab]
        url = "https://console.lab:3780"
        username = "nxadmin"
        password_env = "LAB_CONSOLE_PASSWORD"
        report_format = "html"
        scan_poll_interval = 60
        max_wait = 7200

        [profiles.prod]
        url = "https://console.prod:3780/api/3"
        username = "svc-scan"
        ca_cert = "/etc/ssl/console-ca.pem"
    "#;

    #[test]
    fn file_and_env_layers_merge() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("NEXRUN_DEFAULTS__TIMEOUT", "90");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

            assert_eq!(cfg.active_profile_name(), "lab");
            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.color, "auto");
            assert_eq!(cfg.defaults.timeout, 90);
            assert_eq!(cfg.profiles.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.active_profile_name(), "default");
            assert!(cfg.profiles.is_empty());
            assert!(matches!(
                cfg.profile("default"),
                Err(ConfigError::UnknownProfile { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn profile_translates_to_session_config() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("LAB_CONSOLE_PASSWORD", "from-env");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            let lab = cfg.profile("lab").map_err(|e| e.to_string())?;
            let session = profile_to_session_config(lab, "lab").map_err(|e| e.to_string())?;

            assert_eq!(session.api_url.as_str(), "https://console.lab:3780/api/3");
            assert_eq!(session.username, "nxadmin");
            assert_eq!(session.password.expose_secret(), "from-env");
            assert_eq!(session.tls, TlsVerification::DangerAcceptInvalid);
            assert_eq!(session.timeout, Duration::from_secs(30));
            Ok(())
        });
    }

    #[test]
    fn profile_translates_to_pipeline_options() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            let lab = profile_to_pipeline_options(cfg.profile("lab").map_err(|e| e.to_string())?);

            assert_eq!(lab.report_format, "html");
            assert_eq!(lab.report_template, "audit-report");
            assert_eq!(lab.save_filename, "report.pdf");
            assert_eq!(lab.scan_policy.interval, Duration::from_secs(60));
            assert_eq!(lab.scan_policy.max_wait, Some(Duration::from_secs(7200)));
            assert_eq!(lab.report_policy.interval, Duration::from_secs(30));
            assert_eq!(lab.report_policy.max_attempts, None);
            Ok(())
        });
    }

    #[test]
    fn tls_follows_insecure_and_ca_settings() {
        let mut profile = Profile::default();
        assert_eq!(profile_tls(&profile), TlsVerification::DangerAcceptInvalid);

        profile.insecure = Some(false);
        assert_eq!(profile_tls(&profile), TlsVerification::SystemDefaults);

        profile.ca_cert = Some("/etc/ssl/ca.pem".into());
        assert_eq!(
            profile_tls(&profile),
            TlsVerification::CustomCa("/etc/ssl/ca.pem".into())
        );

        profile.insecure = Some(true);
        assert_eq!(profile_tls(&profile), TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn api_url_keeps_explicit_path() {
        assert_eq!(
            parse_api_url("https://c:3780/api/3").unwrap().as_str(),
            "https://c:3780/api/3"
        );
        assert_eq!(
            parse_api_url("https://c:3780/").unwrap().as_str(),
            "https://c:3780/api/3"
        );
        assert!(matches!(
            parse_api_url("console"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn username_is_required() {
        Jail::expect_with(|_jail| {
            let profile = Profile {
                url: "https://c:3780".into(),
                ..Profile::default()
            };
            let err = resolve_credentials(&profile, "bare").unwrap_err();
            assert!(matches!(err, ConfigError::NoCredentials { .. }));
            Ok(())
        });
    }
}
