//! Site command handlers.

use serde::Serialize;

use nexrun_core::{ResourceId, Session, SiteSpec};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct SiteSummary {
    name: String,
    site_id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

fn detail(site: &SiteSummary) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Site", site.name.clone()),
        ("ID", site.site_id.to_string()),
    ];
    if let Some(ref target) = site.target {
        rows.push(("Target", target.clone()));
    }
    rows
}

pub async fn handle(
    session: &Session,
    resolved: &Resolved,
    args: SitesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let summary = match args.command {
        SitesCommand::Find { name } => {
            let site_id = util::require(session.find_site_id(&name).await, "Site", &name)?;
            SiteSummary {
                name,
                site_id,
                target: None,
            }
        }

        SitesCommand::Ensure {
            name,
            target,
            description,
            template,
        } => {
            let spec = SiteSpec {
                name: name.clone(),
                description: description.unwrap_or_else(|| resolved.options.description.clone()),
                target: target.clone(),
                scan_template_id: template
                    .unwrap_or_else(|| resolved.options.scan_template_id.clone()),
            };
            let site_id = session.ensure_site(&spec).await?;
            SiteSummary {
                name,
                site_id,
                target: Some(target),
            }
        }
    };

    let out = output::render_single(&global.output, &summary, detail, |s| s.site_id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
