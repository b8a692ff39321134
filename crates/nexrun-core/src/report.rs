// ── Report reconciliation and generation ──
//
// A report configuration is reused when its scope already covers the site,
// whatever its name, format or template. Otherwise one is created for the
// scan. Generation is triggered and then polled through the "latest"
// history instance until it reports `complete`.

use nexrun_api::ResourceId;
use nexrun_api::models::{ReportConfigCreate, ReportScope};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::lookup::Lookup;
use crate::poll::{PollOutcome, PollPolicy, poll_until};
use crate::session::Session;

/// History status meaning the artifact is ready.
pub const REPORT_COMPLETE: &str = "complete";

/// Settings for a report configuration created by this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSpec {
    /// Base name; the scan id is appended.
    pub name: String,
    pub format: String,
    pub template: String,
}

impl ReportSpec {
    /// Name given to a configuration created for `scan_id`.
    pub fn config_name(&self, scan_id: &ResourceId) -> String {
        format!("{} report - scan ID {scan_id}", self.name)
    }

    fn to_create(&self, site_id: &ResourceId, scan_id: &ResourceId) -> ReportConfigCreate {
        ReportConfigCreate {
            name: self.config_name(scan_id),
            format: self.format.clone(),
            scope: ReportScope {
                sites: vec![site_id.clone()],
            },
            template: self.template.clone(),
        }
    }
}

impl Session {
    /// First report configuration whose scope includes `site_id`.
    pub async fn existing_report(&self, site_id: &ResourceId) -> Lookup<ResourceId> {
        let result = self.client().list_reports().await.map(|reports| {
            reports
                .into_iter()
                .find(|report| report.covers_site(site_id))
                .map(|report| report.id)
        });
        Lookup::from_result(result)
    }

    /// Reuse a configuration scoped to `site_id`, or create one.
    ///
    /// A reused configuration is not checked against `spec`. When a create
    /// is acknowledged without an id, the scope lookup is repeated.
    pub async fn create_or_reuse_report(
        &self,
        site_id: &ResourceId,
        scan_id: &ResourceId,
        spec: &ReportSpec,
    ) -> Result<Option<ResourceId>, CoreError> {
        if let Some(id) = self.existing_report(site_id).await.found() {
            info!(%site_id, report_id = %id, "reusing report configuration");
            return Ok(Some(id));
        }

        let body = spec.to_create(site_id, scan_id);
        if let Some(id) = self.client().create_report(&body).await? {
            info!(%site_id, report_id = %id, name = %body.name, "report configuration created");
            return Ok(Some(id));
        }

        debug!(%site_id, "create returned no id, looking it up");
        Ok(self.existing_report(site_id).await.found())
    }

    /// Trigger generation of `report_id`.
    ///
    /// Returns the history instance id when the console echoes one.
    pub async fn start_report_generation(
        &self,
        report_id: &ResourceId,
    ) -> Result<Option<ResourceId>, CoreError> {
        match self.client().generate_report(report_id).await {
            Ok(instance) => {
                info!(%report_id, "report generation started");
                Ok(instance)
            }
            Err(e) => {
                warn!(%report_id, error = %e, "report generation could not be started");
                Err(e.into())
            }
        }
    }

    /// Poll the latest history of `report_id` until it is complete.
    ///
    /// Returns the `generated` timestamp exactly as the console wrote it.
    pub async fn wait_for_report(
        &self,
        report_id: &ResourceId,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, CoreError> {
        let what = format!("report {report_id}");
        info!(%report_id, interval = ?policy.interval, "waiting for report");

        let generated = poll_until(&what, policy, cancel, self.progress(), move || async move {
            let history = self.client().report_history(report_id, "latest").await?;
            let status = history.status.unwrap_or_default();
            Ok::<_, nexrun_api::Error>(if status == REPORT_COMPLETE {
                PollOutcome::Done(history.generated)
            } else {
                PollOutcome::Pending(status)
            })
        })
        .await?;

        info!(%report_id, generated = generated.as_deref().unwrap_or("-"), "report ready");
        Ok(generated)
    }

    /// `generated` timestamp of one history instance, if the console set it.
    pub async fn report_generated(
        &self,
        report_id: &ResourceId,
        instance: &str,
    ) -> Result<Option<String>, CoreError> {
        let history = self.client().report_history(report_id, instance).await?;
        Ok(history.generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_config_is_named_after_scan_and_scoped_to_site() {
        let spec = ReportSpec {
            name: "Web Tier".into(),
            format: "pdf".into(),
            template: "audit-report".into(),
        };
        let body = spec.to_create(&ResourceId::Numeric(42), &ResourceId::Numeric(901));
        assert_eq!(body.name, "Web Tier report - scan ID 901");
        assert_eq!(body.scope.sites, vec![ResourceId::Numeric(42)]);
        assert_eq!(body.format, "pdf");
        assert_eq!(body.template, "audit-report");
    }
}
