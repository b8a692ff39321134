// Report endpoints
//
// A report configuration is created once, then generated on demand. Each
// generation becomes a history instance whose output is downloaded as a
// binary stream.

use bytes::Bytes;
use tracing::debug;

use crate::client::NexposeClient;
use crate::error::Error;
use crate::models::{ReportConfig, ReportConfigCreate, ReportHistory, ResourceId};

/// Streaming body of a report history instance.
///
/// Only constructed for an exact `200 OK`; pull the bytes with
/// [`next_chunk`](Self::next_chunk).
#[derive(Debug)]
pub struct ReportOutput {
    response: reqwest::Response,
}

impl ReportOutput {
    /// Size announced by the console, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Next chunk of the body, or `None` once it is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        Ok(self.response.chunk().await?)
    }
}

impl NexposeClient {
    /// List every report configuration, across all pages.
    ///
    /// `GET /reports`
    pub async fn list_reports(&self) -> Result<Vec<ReportConfig>, Error> {
        let url = self.url("reports")?;
        debug!("listing report configurations");
        self.collect_pages(url).await
    }

    /// Create a report configuration.
    ///
    /// `POST /reports`. Returns the new id when the console echoes one back.
    pub async fn create_report(
        &self,
        report: &ReportConfigCreate,
    ) -> Result<Option<ResourceId>, Error> {
        let url = self.url("reports")?;
        debug!(name = %report.name, "creating report configuration");
        let reference = self.post_reference(url, Some(report)).await?;
        Ok(reference.and_then(|r| r.id))
    }

    /// Trigger generation of a report.
    ///
    /// `POST /reports/{report_id}/generate`. Returns the history instance id
    /// when the console echoes one back.
    pub async fn generate_report(
        &self,
        report_id: &ResourceId,
    ) -> Result<Option<ResourceId>, Error> {
        let url = self.url(&format!("reports/{report_id}/generate"))?;
        debug!(%report_id, "triggering report generation");
        let reference = self.post_reference::<()>(url, None).await?;
        Ok(reference.and_then(|r| r.id))
    }

    /// Fetch one history instance (`"latest"` for the most recent).
    ///
    /// `GET /reports/{report_id}/history/{instance}`
    pub async fn report_history(
        &self,
        report_id: &ResourceId,
        instance: &str,
    ) -> Result<ReportHistory, Error> {
        let url = self.url(&format!("reports/{report_id}/history/{instance}"))?;
        debug!(%report_id, instance, "fetching report history");
        self.get(url).await
    }

    /// Open the generated output of a history instance for streaming.
    ///
    /// `GET /reports/{report_id}/history/{instance}/output`. Anything other
    /// than `200 OK` is an error.
    pub async fn open_report_output(
        &self,
        report_id: &ResourceId,
        instance: &str,
    ) -> Result<ReportOutput, Error> {
        let url = self.url(&format!("reports/{report_id}/history/{instance}/output"))?;
        let response = self.get_raw(url).await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Self::parse_error(status, response).await);
        }

        Ok(ReportOutput { response })
    }
}
