// Site endpoints
//
// Sites are the console's scan targets: a named set of addresses plus the
// scan template used against them.

use tracing::debug;

use crate::client::NexposeClient;
use crate::error::Error;
use crate::models::{ResourceId, SiteCreate, SiteResource};

impl NexposeClient {
    /// List every site visible to the API user, across all pages.
    ///
    /// `GET /sites`
    pub async fn list_sites(&self) -> Result<Vec<SiteResource>, Error> {
        let url = self.url("sites")?;
        debug!("listing sites");
        self.collect_pages(url).await
    }

    /// Create a site.
    ///
    /// `POST /sites`. Returns the new id when the console echoes one back.
    pub async fn create_site(&self, site: &SiteCreate) -> Result<Option<ResourceId>, Error> {
        let url = self.url("sites")?;
        debug!(name = %site.name, "creating site");
        let reference = self.post_reference(url, Some(site)).await?;
        Ok(reference.and_then(|r| r.id))
    }
}
