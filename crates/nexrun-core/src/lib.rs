// nexrun-core: Scan orchestration engine between nexrun-api and its consumers.

pub mod config;
pub mod download;
pub mod error;
pub mod lookup;
pub mod pipeline;
pub mod poll;
pub mod report;
pub mod scan;
pub mod session;
pub mod site;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SessionConfig, TlsVerification};
pub use download::{
    ArtifactStore, DEFAULT_REPORT_DIR, DEFAULT_REPORT_FILENAME, FsArtifactStore, artifact_path,
};
pub use error::CoreError;
pub use lookup::{Lookup, LookupFailure};
pub use pipeline::{PipelineOptions, PipelineReport, Stage, title_case};
pub use poll::{PollPolicy, WaitState};
pub use report::ReportSpec;
pub use scan::ScanStatus;
pub use session::Session;
pub use site::SiteSpec;

// Identifiers flow through every stage; re-export so consumers need not
// depend on the API crate directly.
pub use nexrun_api::ResourceId;
