//! Clap derive structures for the `nexrun` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.
//! Compiled by `build.rs` as well, so it may only depend on clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nexrun -- drive Nexpose scans from site to downloaded report
#[derive(Debug, Parser)]
#[command(
    name = "nexrun",
    version,
    about = "Run Nexpose vulnerability scans end to end from the command line",
    long_about = "Reconciles a site for a target, starts a scan, waits for it, \
        reconciles a report configuration, generates the report and downloads it.\n\n\
        Each stage is also available on its own under `sites`, `scans` and `reports`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Console profile to use
    #[arg(long, short = 'p', env = "NEXRUN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Console URL (overrides profile); a bare host gets /api/3 appended
    #[arg(long, env = "NEXRUN_URL", global = true)]
    pub url: Option<String>,

    /// API user name (overrides profile)
    #[arg(long, short = 'u', env = "NEXRUN_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NEXRUN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NEXRUN_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NEXRUN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the whole scan-to-report pipeline for one target
    Run(RunArgs),

    /// Find or create sites
    Sites(SitesArgs),

    /// Start and watch scans
    Scans(ScansArgs),

    /// Configure, generate and download reports
    #[command(alias = "rep")]
    Reports(ReportsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Wait Arguments ────────────────────────────────────────────

/// Limits for commands that poll the console until something finishes.
#[derive(Debug, Args)]
pub struct WaitOpts {
    /// Delay between polls, e.g. "30s" or "2m30s"
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Give up after this many polls
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Give up after this much time, e.g. "4h"
    #[arg(long, value_name = "DURATION")]
    pub max_wait: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Scan name; also names the site and the report configuration
    #[arg(long, short = 's')]
    pub scan_name: String,

    /// Address or host name to scan
    #[arg(long, short = 't')]
    pub target: String,

    /// Description for a newly created site
    #[arg(long)]
    pub description: Option<String>,

    /// Scan template for a newly created site
    #[arg(long)]
    pub template: Option<String>,

    /// Report format (pdf, html, ...)
    #[arg(long)]
    pub report_format: Option<String>,

    /// Report template id
    #[arg(long)]
    pub report_template: Option<String>,

    /// File name of the downloaded report
    #[arg(long)]
    pub filename: Option<String>,

    /// Directory downloads are written under
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Use the scan name and target exactly as given (trimmed only)
    #[arg(long)]
    pub no_title_case: bool,

    /// Delay between scan status polls
    #[arg(long, value_name = "DURATION")]
    pub scan_poll_interval: Option<String>,

    /// Delay between report status polls
    #[arg(long, value_name = "DURATION")]
    pub report_poll_interval: Option<String>,

    /// Give up each wait after this many polls
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Give up each wait after this much time
    #[arg(long, value_name = "DURATION")]
    pub max_wait: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SITES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// Look up a site id by exact name
    Find {
        /// Site name
        name: String,
    },

    /// Return the id of the named site, creating it if needed
    Ensure {
        /// Site name
        #[arg(long)]
        name: String,

        /// Single address or host name the site scans
        #[arg(long)]
        target: String,

        /// Description for a newly created site
        #[arg(long)]
        description: Option<String>,

        /// Scan template for a newly created site
        #[arg(long)]
        template: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCANS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScansArgs {
    #[command(subcommand)]
    pub command: ScansCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScansCommand {
    /// Start a scan of a site
    Start {
        /// Site id
        site_id: String,

        /// Wait for the scan to finish
        #[arg(long, short = 'w')]
        wait: bool,

        #[command(flatten)]
        limits: WaitOpts,
    },

    /// Id of the most recent scan on the console
    Last,

    /// Current status of a scan
    Status {
        /// Scan id
        scan_id: String,
    },

    /// Wait until a scan is finished or stopped
    Wait {
        /// Scan id
        scan_id: String,

        #[command(flatten)]
        limits: WaitOpts,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// Find the report configuration scoped to a site
    Find {
        /// Site id
        site_id: String,
    },

    /// Reuse the site's report configuration, or create one
    Ensure {
        /// Site id the report covers
        #[arg(long)]
        site_id: String,

        /// Scan id used in the configuration name
        #[arg(long)]
        scan_id: String,

        /// Scan name used in the configuration name
        #[arg(long)]
        name: String,

        /// Report format (pdf, html, ...)
        #[arg(long)]
        format: Option<String>,

        /// Report template id
        #[arg(long)]
        template: Option<String>,
    },

    /// Start generating a report
    Generate {
        /// Report configuration id
        report_id: String,

        /// Wait for generation to complete
        #[arg(long, short = 'w')]
        wait: bool,

        #[command(flatten)]
        limits: WaitOpts,
    },

    /// Wait until the latest generation is complete
    Wait {
        /// Report configuration id
        report_id: String,

        #[command(flatten)]
        limits: WaitOpts,
    },

    /// Download a generated report
    Download {
        /// Report configuration id
        report_id: String,

        /// History instance to download
        #[arg(long, default_value = "latest")]
        instance: String,

        /// Directory downloads are written under
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Scanned address; with the generation time it names the
        /// download directory
        #[arg(long)]
        address: Option<String>,

        /// File name of the downloaded report
        #[arg(long)]
        filename: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the current configuration, passwords redacted
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
