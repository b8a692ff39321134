//! `nexrun run`: the whole pipeline for one target.

use nexrun_core::{FsArtifactStore, PipelineOptions, PipelineReport, Session};

use crate::cli::{GlobalOpts, RunArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

/// Profile options with the run's flags layered on top.
fn run_options(base: &PipelineOptions, args: &RunArgs) -> Result<PipelineOptions, CliError> {
    let mut options = base.clone();
    if let Some(ref description) = args.description {
        options.description.clone_from(description);
    }
    if let Some(ref template) = args.template {
        options.scan_template_id.clone_from(template);
    }
    if let Some(ref format) = args.report_format {
        options.report_format.clone_from(format);
    }
    if let Some(ref template) = args.report_template {
        options.report_template.clone_from(template);
    }
    if let Some(ref filename) = args.filename {
        options.save_filename.clone_from(filename);
    }
    options.title_case = !args.no_title_case;
    options.scan_policy = util::limit_policy(
        options.scan_policy,
        args.scan_poll_interval.as_deref(),
        args.max_attempts,
        args.max_wait.as_deref(),
    )?;
    options.report_policy = util::limit_policy(
        options.report_policy,
        args.report_poll_interval.as_deref(),
        args.max_attempts,
        args.max_wait.as_deref(),
    )?;
    Ok(options)
}

fn detail(report: &PipelineReport, color: bool) -> Vec<(&'static str, String)> {
    vec![
        ("Scan name", report.scan_name.clone()),
        ("Target", report.target.clone()),
        ("Site", report.site_id.to_string()),
        ("Scan", report.scan_id.to_string()),
        ("Scan status", output::paint_status(&report.scan_status, color)),
        ("Report", report.report_id.to_string()),
        (
            "Generated",
            report.generated.clone().unwrap_or_else(|| "-".into()),
        ),
        ("Saved to", report.saved_to.display().to_string()),
    ]
}

pub async fn handle(
    session: &Session,
    resolved: &Resolved,
    args: RunArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = run_options(&resolved.options, &args)?;
    let store = FsArtifactStore::new(args.dir.clone().unwrap_or_else(|| resolved.output_dir.clone()));
    tracing::debug!(profile = %resolved.profile, root = %store.root().display(), "starting run");

    let report = {
        let _spinner = util::WaitSpinner::start(session, global);
        let cancel = util::cancel_on_ctrl_c();
        session
            .run_pipeline(&args.scan_name, &args.target, &options, &store, &cancel)
            .await?
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| r.saved_to.display().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
