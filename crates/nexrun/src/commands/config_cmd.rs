//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use serde::Serialize;
use tabled::Tabled;

use nexrun_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Replace stored plaintext passwords before the config is displayed.
fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
}

#[derive(Debug, Serialize)]
struct ProfileSummary {
    name: String,
    url: String,
    username: Option<String>,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "User")]
    username: String,
}

fn profile_row(p: &ProfileSummary) -> ProfileRow {
    ProfileRow {
        marker: if p.default { "*" } else { "" },
        name: p.name.clone(),
        url: p.url.clone(),
        username: p.username.clone().unwrap_or_else(|| "-".into()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let mut cfg = nexrun_config::load_config()?;
            redact(&mut cfg);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| {
                    let rendered = toml::to_string_pretty(c)
                        .unwrap_or_else(|e| format!("(could not render TOML: {e})"));
                    vec![
                        ("Path", nexrun_config::config_path().display().to_string()),
                        ("Config", rendered),
                    ]
                },
                |c| c.active_profile_name().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = nexrun_config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            let mut profiles: Vec<ProfileSummary> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileSummary {
                    default: *name == active,
                    name: name.clone(),
                    url: p.url.clone(),
                    username: p.username.clone(),
                })
                .collect();
            profiles.sort_by(|a, b| a.name.cmp(&b.name));

            let out = output::render_list(&global.output, &profiles, profile_row, |p| p.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = nexrun_config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            nexrun_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = nexrun_config::load_config()?;
            let name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let password =
                rpassword::prompt_password(format!("Password for profile '{name}': "))
                    .map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            nexrun_config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("Password for '{name}' stored in the system keyring");
            }
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = nexrun_config::load_config_or_default();
    eprintln!("nexrun configuration wizard");
    eprintln!("   Config path: {}\n", nexrun_config::config_path().display());

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Console URL")
        .default("https://localhost:3780".into())
        .interact_text()
        .map_err(prompt_err)?;
    // Fail early on a URL the session could not use.
    nexrun_config::parse_api_url(&url)?;

    let username: String = Input::new()
        .with_prompt("User name")
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if username.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "user name and password cannot be empty".into(),
        });
    }

    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let password_field = if store_selection == 0 {
        nexrun_config::store_password(&name, &password)?;
        eprintln!("   Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    let insecure = Confirm::new()
        .with_prompt("Accept self-signed certificates?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;

    cfg.profiles.insert(
        name.clone(),
        Profile {
            url,
            username: Some(username),
            password: password_field,
            insecure: Some(insecure),
            ..Profile::default()
        },
    );
    if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.clone());
    }

    let path = nexrun_config::save_config(&cfg)?;
    eprintln!("\n   Profile '{name}' saved to {}", path.display());
    Ok(())
}
