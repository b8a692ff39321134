// Scan endpoints
//
// Scans are started per site and read back from the global `/scans`
// collection, which is paginated with `first`/`next`/`last` links.

use tracing::debug;

use crate::client::NexposeClient;
use crate::error::Error;
use crate::models::{Page, ResourceId, ScanResource};

impl NexposeClient {
    /// Start an ad-hoc scan of a site with its configured template.
    ///
    /// `POST /sites/{site_id}/scans`. Returns the new scan id when the
    /// console echoes one back.
    pub async fn start_site_scan(&self, site_id: &ResourceId) -> Result<Option<ResourceId>, Error> {
        let url = self.url(&format!("sites/{site_id}/scans"))?;
        debug!(%site_id, "starting scan");
        let reference = self.post_reference::<()>(url, None).await?;
        Ok(reference.and_then(|r| r.id))
    }

    /// First page of the global scan listing.
    ///
    /// `GET /scans`
    pub async fn list_scans_page(&self) -> Result<Page<ScanResource>, Error> {
        let url = self.url("scans")?;
        debug!("listing scans");
        self.get(url).await
    }

    /// Fetch a single scan.
    ///
    /// `GET /scans/{scan_id}`
    pub async fn get_scan(&self, scan_id: &ResourceId) -> Result<ScanResource, Error> {
        let url = self.url(&format!("scans/{scan_id}"))?;
        debug!(%scan_id, "fetching scan");
        self.get(url).await
    }
}
