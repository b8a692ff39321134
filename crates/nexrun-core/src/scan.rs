// ── Scan driver ──
//
// Start a scan against a site, find out which scan was started, and poll it
// until it reaches a terminal state.

use std::fmt;

use nexrun_api::ResourceId;
use nexrun_api::models::ScanResource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::lookup::Lookup;
use crate::poll::{PollOutcome, PollPolicy, poll_until};
use crate::session::Session;

/// Lifecycle state reported by the console for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    Running,
    Finished,
    Stopped,
    /// Any value this client does not interpret, kept verbatim.
    Other(String),
}

impl ScanStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "running" => Self::Running,
            "finished" => Self::Finished,
            "stopped" => Self::Stopped,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Stopped => "stopped",
            Self::Other(raw) => raw,
        }
    }

    /// Only `finished` and `stopped` end a wait; unknown values keep polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Stopped)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ScanResource> for ScanStatus {
    fn from(scan: &ScanResource) -> Self {
        Self::parse(scan.status.as_deref().unwrap_or_default())
    }
}

impl Session {
    /// Start a scan of `site_id` and return the id of the scan started.
    ///
    /// A rejected start is an error and nothing else is requested. When the
    /// console does not echo the new id, falls back to [`last_scan_id`],
    /// which assumes the newest scan sorts last.
    ///
    /// [`last_scan_id`]: Self::last_scan_id
    pub async fn start_scan(&self, site_id: &ResourceId) -> Result<Option<ResourceId>, CoreError> {
        if let Some(id) = self.client().start_site_scan(site_id).await? {
            info!(%site_id, scan_id = %id, "scan started");
            return Ok(Some(id));
        }

        debug!(%site_id, "scan start returned no id, reading last scan");
        let id = self.last_scan_id().await.found();
        match &id {
            Some(scan_id) => info!(%site_id, %scan_id, "scan started"),
            None => warn!(%site_id, "scan started but its id could not be determined"),
        }
        Ok(id)
    }

    /// Id of the last scan on the last page of the global scan listing.
    pub async fn last_scan_id(&self) -> Lookup<ResourceId> {
        let result = async {
            let first = self.client().list_scans_page().await?;
            let page = match first.link("last") {
                Some(href) => self.client().get_page::<ScanResource>(href).await?,
                None => first,
            };
            Ok::<_, nexrun_api::Error>(page.resources.into_iter().last().map(|scan| scan.id))
        }
        .await;
        Lookup::from_result(result)
    }

    /// Current status of one scan.
    pub async fn scan_status(&self, scan_id: &ResourceId) -> Result<ScanStatus, CoreError> {
        let scan = self.client().get_scan(scan_id).await?;
        Ok(ScanStatus::from(&scan))
    }

    /// Poll `scan_id` until it is `finished` or `stopped`.
    pub async fn wait_for_scan(
        &self,
        scan_id: &ResourceId,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<ScanStatus, CoreError> {
        let what = format!("scan {scan_id}");
        info!(%scan_id, interval = ?policy.interval, "waiting for scan");

        let status = poll_until(&what, policy, cancel, self.progress(), move || async move {
            let scan = self.client().get_scan(scan_id).await?;
            let status = ScanStatus::from(&scan);
            Ok::<_, nexrun_api::Error>(if status.is_terminal() {
                PollOutcome::Done(status)
            } else {
                PollOutcome::Pending(status.to_string())
            })
        })
        .await?;

        info!(%scan_id, %status, "scan completed");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finished_and_stopped_are_terminal() {
        assert!(ScanStatus::parse("finished").is_terminal());
        assert!(ScanStatus::parse("stopped").is_terminal());
        assert!(!ScanStatus::parse("running").is_terminal());
        assert!(!ScanStatus::parse("integrating").is_terminal());
        assert!(!ScanStatus::parse("Finished").is_terminal());
        assert!(!ScanStatus::parse("").is_terminal());
    }

    #[test]
    fn unknown_status_round_trips_verbatim() {
        let status = ScanStatus::parse("dispatched");
        assert_eq!(status, ScanStatus::Other("dispatched".into()));
        assert_eq!(status.to_string(), "dispatched");
    }
}
