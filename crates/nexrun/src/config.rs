//! Resolution of the active profile plus global flag overrides into the
//! settings a command runs with.

use std::path::PathBuf;

use nexrun_config::{Config, Profile};
use nexrun_core::{PipelineOptions, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a console-bound command needs.
#[derive(Debug)]
pub struct Resolved {
    pub profile: String,
    pub session: SessionConfig,
    pub options: PipelineOptions,
    /// Root that downloads are written under.
    pub output_dir: PathBuf,
}

/// Profile name selected by `--profile`, else the config default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| cfg.active_profile_name().to_owned())
}

/// Resolve the active profile with global flags layered on top.
///
/// Without a matching profile the flags alone must name a console; an
/// explicitly requested profile must exist.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = nexrun_config::load_config()?;
    let name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        None if global.url.is_some() => Profile::default(),
        None => {
            return Err(CliError::NoConfig {
                path: nexrun_config::config_path().display().to_string(),
            });
        }
    };

    // [defaults] fills what the profile leaves unset.
    profile.timeout.get_or_insert(cfg.defaults.timeout);
    if cfg.defaults.insecure {
        profile.insecure.get_or_insert(true);
    }
    apply_overrides(&mut profile, global);

    let session = nexrun_config::profile_to_session_config(&profile, &name)?;
    let options = nexrun_config::profile_to_pipeline_options(&profile);
    let output_dir = profile.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    Ok(Resolved {
        profile: name,
        session,
        options,
        output_dir,
    })
}

/// Global flags win over profile values.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Comma-separated, sorted profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["nexrun"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["scans", "last"]);
        Cli::try_parse_from(argv)
            .map(|cli| cli.global)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn flags_override_profile_values() {
        let mut profile = Profile {
            url: "https://console:3780".into(),
            username: Some("nxadmin".into()),
            timeout: Some(30),
            ..Profile::default()
        };
        let opts = global(&[
            "--url",
            "https://other:3780",
            "-u",
            "auditor",
            "-k",
            "--timeout",
            "90",
        ]);

        apply_overrides(&mut profile, &opts);

        assert_eq!(profile.url, "https://other:3780");
        assert_eq!(profile.username.as_deref(), Some("auditor"));
        assert_eq!(profile.insecure, Some(true));
        assert_eq!(profile.timeout, Some(90));
    }

    #[test]
    fn absent_flags_leave_profile_alone() {
        let mut profile = Profile {
            url: "https://console:3780".into(),
            insecure: Some(false),
            ..Profile::default()
        };
        apply_overrides(&mut profile, &global(&[]));

        assert_eq!(profile.url, "https://console:3780");
        assert_eq!(profile.insecure, Some(false));
        assert_eq!(profile.timeout, None);
    }

    #[test]
    fn profile_names_are_listed_sorted() {
        let mut cfg = Config::default();
        assert_eq!(available_profiles(&cfg), "(none)");

        cfg.profiles.insert("prod".into(), Profile::default());
        cfg.profiles.insert("lab".into(), Profile::default());
        assert_eq!(available_profiles(&cfg), "lab, prod");
    }
}
