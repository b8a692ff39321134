// ── Scan-to-report pipeline ──
//
// Site → scan → wait → report config → generate → wait → download, one
// target at a time. Each stage must hand a usable value to the next; a
// stage that fails or comes back empty ends the run with a `Stage` error.

use std::path::PathBuf;

use nexrun_api::ResourceId;
use serde::Serialize;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::download::{ArtifactStore, DEFAULT_REPORT_FILENAME, artifact_path};
use crate::error::CoreError;
use crate::poll::PollPolicy;
use crate::report::ReportSpec;
use crate::scan::ScanStatus;
use crate::session::Session;
use crate::site::SiteSpec;

/// Pipeline stage, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Site,
    Scan,
    Report,
    Generate,
    Download,
}

/// Everything the pipeline needs besides the scan name and target.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub description: String,
    pub scan_template_id: String,
    pub report_format: String,
    pub report_template: String,
    pub save_filename: String,
    pub scan_policy: PollPolicy,
    pub report_policy: PollPolicy,
    /// Trim and title-case the scan name and target before use.
    pub title_case: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            description: "Scan description".into(),
            scan_template_id: "full-audit-without-web-spider".into(),
            report_format: "pdf".into(),
            report_template: "audit-report".into(),
            save_filename: DEFAULT_REPORT_FILENAME.into(),
            scan_policy: PollPolicy::scans(),
            report_policy: PollPolicy::reports(),
            title_case: true,
        }
    }
}

impl PipelineOptions {
    /// Normalize a user-supplied name or target.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if self.title_case {
            title_case(trimmed)
        } else {
            trimmed.to_owned()
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub scan_name: String,
    pub target: String,
    pub site_id: ResourceId,
    pub scan_id: ResourceId,
    pub scan_status: String,
    pub report_id: ResourceId,
    pub generated: Option<String>,
    pub saved_to: PathBuf,
}

/// Upper-case the first letter of every run of letters and lower-case the
/// rest, so `"web-tier 01"` becomes `"Web-Tier 01"`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn missing(stage: Stage, entity: &str, identifier: String) -> CoreError {
    CoreError::NotFound {
        entity: entity.into(),
        identifier,
    }
    .at(stage)
}

impl Session {
    /// Run the whole scan-to-report flow for one target.
    pub async fn run_pipeline<S: ArtifactStore>(
        &self,
        scan_name: &str,
        target: &str,
        options: &PipelineOptions,
        store: &S,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, CoreError> {
        let scan_name = options.normalize(scan_name);
        let target = options.normalize(target);
        info!(%scan_name, %target, "starting pipeline");

        // ── Site ────────────────────────────────────────────────────
        let site = SiteSpec {
            name: scan_name.clone(),
            description: options.description.clone(),
            target: target.clone(),
            scan_template_id: options.scan_template_id.clone(),
        };
        let site_id = self
            .ensure_site(&site)
            .await
            .map_err(|e| e.at(Stage::Site))?;

        // ── Scan ────────────────────────────────────────────────────
        let scan_id = self
            .start_scan(&site_id)
            .await
            .map_err(|e| e.at(Stage::Scan))?
            .ok_or_else(|| missing(Stage::Scan, "Scan", format!("started on site {site_id}")))?;
        let scan_status = self
            .wait_for_scan(&scan_id, &options.scan_policy, cancel)
            .await
            .map_err(|e| e.at(Stage::Scan))?;
        if scan_status == ScanStatus::Stopped {
            warn!(%scan_id, "scan was stopped before finishing, reporting on partial results");
        }

        // ── Report ──────────────────────────────────────────────────
        let spec = ReportSpec {
            name: scan_name.clone(),
            format: options.report_format.clone(),
            template: options.report_template.clone(),
        };
        let report_id = self
            .create_or_reuse_report(&site_id, &scan_id, &spec)
            .await
            .map_err(|e| e.at(Stage::Report))?
            .ok_or_else(|| {
                missing(
                    Stage::Report,
                    "Report configuration",
                    format!("for site {site_id}"),
                )
            })?;

        // ── Generate ────────────────────────────────────────────────
        self.start_report_generation(&report_id)
            .await
            .map_err(|e| e.at(Stage::Generate))?;
        let generated = self
            .wait_for_report(&report_id, &options.report_policy, cancel)
            .await
            .map_err(|e| e.at(Stage::Generate))?;

        // ── Download ────────────────────────────────────────────────
        let relative = artifact_path(generated.as_deref(), Some(&target), &options.save_filename);
        let saved_to = self
            .download_report(&report_id, "latest", &relative, store)
            .await
            .map_err(|e| e.at(Stage::Download))?;

        info!(%scan_name, path = %saved_to.display(), "pipeline finished");
        Ok(PipelineReport {
            scan_name,
            target,
            site_id,
            scan_id,
            scan_status: scan_status.to_string(),
            report_id,
            generated,
            saved_to,
        })
    }
}
