//! Report command handlers.

use std::path::PathBuf;

use serde::Serialize;

use nexrun_core::{CoreError, FsArtifactStore, ReportSpec, ResourceId, Session, artifact_path};

use crate::cli::{GlobalOpts, ReportsArgs, ReportsCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Default, Serialize)]
struct ReportSummary {
    report_id: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_to: Option<PathBuf>,
}

impl ReportSummary {
    fn of(report_id: ResourceId) -> Self {
        Self {
            report_id: Some(report_id),
            ..Self::default()
        }
    }
}

fn detail(report: &ReportSummary) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(ref id) = report.report_id {
        rows.push(("Report", id.to_string()));
    }
    if let Some(ref instance) = report.instance {
        rows.push(("Instance", instance.to_string()));
    }
    if let Some(ref generated) = report.generated {
        rows.push(("Generated", generated.clone()));
    }
    if let Some(ref path) = report.saved_to {
        rows.push(("Saved to", path.display().to_string()));
    }
    rows
}

/// Plain output: the saved path for downloads, the id otherwise.
fn plain(report: &ReportSummary) -> String {
    report.saved_to.as_ref().map_or_else(
        || {
            report
                .report_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        },
        |path| path.display().to_string(),
    )
}

pub async fn handle(
    session: &Session,
    resolved: &Resolved,
    args: ReportsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let summary = match args.command {
        ReportsCommand::Find { site_id } => {
            let site_id = util::parse_id(&site_id);
            let report_id = util::require(
                session.existing_report(&site_id).await,
                "Report configuration",
                &format!("for site {site_id}"),
            )?;
            ReportSummary::of(report_id)
        }

        ReportsCommand::Ensure {
            site_id,
            scan_id,
            name,
            format,
            template,
        } => {
            let site_id = util::parse_id(&site_id);
            let scan_id = util::parse_id(&scan_id);
            let spec = ReportSpec {
                name,
                format: format.unwrap_or_else(|| resolved.options.report_format.clone()),
                template: template.unwrap_or_else(|| resolved.options.report_template.clone()),
            };
            let report_id = session
                .create_or_reuse_report(&site_id, &scan_id, &spec)
                .await?
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Report configuration".into(),
                    identifier: format!("for site {site_id}"),
                })?;
            ReportSummary::of(report_id)
        }

        ReportsCommand::Generate {
            report_id,
            wait,
            limits,
        } => {
            let report_id = util::parse_id(&report_id);
            let policy = util::wait_policy(&limits, resolved.options.report_policy)?;
            let instance = session.start_report_generation(&report_id).await?;
            let generated = if wait {
                let _spinner = util::WaitSpinner::start(session, global);
                let cancel = util::cancel_on_ctrl_c();
                session.wait_for_report(&report_id, &policy, &cancel).await?
            } else {
                None
            };
            ReportSummary {
                instance,
                generated,
                ..ReportSummary::of(report_id)
            }
        }

        ReportsCommand::Wait { report_id, limits } => {
            let report_id = util::parse_id(&report_id);
            let policy = util::wait_policy(&limits, resolved.options.report_policy)?;
            let _spinner = util::WaitSpinner::start(session, global);
            let cancel = util::cancel_on_ctrl_c();
            let generated = session.wait_for_report(&report_id, &policy, &cancel).await?;
            ReportSummary {
                generated,
                ..ReportSummary::of(report_id)
            }
        }

        ReportsCommand::Download {
            report_id,
            instance,
            dir,
            address,
            filename,
        } => {
            let report_id = util::parse_id(&report_id);
            // The directory name needs the generation time, which only
            // matters once an address is known.
            let generated = if address.is_some() {
                session.report_generated(&report_id, &instance).await?
            } else {
                None
            };
            let filename = filename.unwrap_or_else(|| resolved.options.save_filename.clone());
            let relative = artifact_path(generated.as_deref(), address.as_deref(), &filename);
            let store = FsArtifactStore::new(dir.unwrap_or_else(|| resolved.output_dir.clone()));

            let saved_to = session
                .download_report(&report_id, &instance, &relative, &store)
                .await?;
            ReportSummary {
                generated,
                saved_to: Some(saved_to),
                ..ReportSummary::of(report_id)
            }
        }
    };

    let out = output::render_single(&global.output, &summary, detail, plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
