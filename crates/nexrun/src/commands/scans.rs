//! Scan command handlers.

use serde::Serialize;

use nexrun_core::{CoreError, ResourceId, Session};

use crate::cli::{GlobalOpts, ScansArgs, ScansCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct ScanSummary {
    scan_id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_id: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

pub async fn handle(
    session: &Session,
    resolved: &Resolved,
    args: ScansArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let summary = match args.command {
        ScansCommand::Start {
            site_id,
            wait,
            limits,
        } => {
            let site_id = util::parse_id(&site_id);
            let policy = util::wait_policy(&limits, resolved.options.scan_policy)?;
            let scan_id = session
                .start_scan(&site_id)
                .await?
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Scan".into(),
                    identifier: format!("started on site {site_id}"),
                })?;
            let status = if wait {
                let _spinner = util::WaitSpinner::start(session, global);
                let cancel = util::cancel_on_ctrl_c();
                Some(session.wait_for_scan(&scan_id, &policy, &cancel).await?.to_string())
            } else {
                None
            };
            ScanSummary {
                scan_id,
                site_id: Some(site_id),
                status,
            }
        }

        ScansCommand::Last => ScanSummary {
            scan_id: util::require(session.last_scan_id().await, "Scan", "most recent")?,
            site_id: None,
            status: None,
        },

        ScansCommand::Status { scan_id } => {
            let scan_id = util::parse_id(&scan_id);
            let status = session.scan_status(&scan_id).await?;
            ScanSummary {
                scan_id,
                site_id: None,
                status: Some(status.to_string()),
            }
        }

        ScansCommand::Wait { scan_id, limits } => {
            let scan_id = util::parse_id(&scan_id);
            let policy = util::wait_policy(&limits, resolved.options.scan_policy)?;
            let _spinner = util::WaitSpinner::start(session, global);
            let cancel = util::cancel_on_ctrl_c();
            let status = session.wait_for_scan(&scan_id, &policy, &cancel).await?;
            ScanSummary {
                scan_id,
                site_id: None,
                status: Some(status.to_string()),
            }
        }
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &summary,
        |s| {
            let mut rows = vec![("Scan", s.scan_id.to_string())];
            if let Some(ref site_id) = s.site_id {
                rows.push(("Site", site_id.to_string()));
            }
            if let Some(ref status) = s.status {
                rows.push(("Status", output::paint_status(status, color)));
            }
            rows
        },
        |s| s.scan_id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
