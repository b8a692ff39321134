// ── Site reconciliation ──
//
// A site is looked up by exact, case-sensitive name before anything is
// created. An existing site is reused as-is, even if its targets or
// template differ from what the caller asked for.

use nexrun_api::ResourceId;
use nexrun_api::models::SiteCreate;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::lookup::Lookup;
use crate::session::Session;

/// Creation attempts `ensure_site` makes before giving up on a racing
/// writer.
const ENSURE_ATTEMPTS: u32 = 3;

/// Desired shape of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSpec {
    pub name: String,
    pub description: String,
    pub target: String,
    pub scan_template_id: String,
}

impl SiteSpec {
    fn to_create(&self) -> SiteCreate {
        SiteCreate::single_target(
            self.name.clone(),
            self.description.clone(),
            self.target.clone(),
            self.scan_template_id.clone(),
        )
    }
}

impl Session {
    /// Find the id of the first site named exactly `name`.
    pub async fn find_site_id(&self, name: &str) -> Lookup<ResourceId> {
        let result = self.client().list_sites().await.map(|sites| {
            sites
                .into_iter()
                .find(|site| site.name == name)
                .map(|site| site.id)
        });
        Lookup::from_result(result)
    }

    /// Reuse a same-named site or create one.
    ///
    /// Returns the id of an existing site without creating anything. After
    /// a successful creation returns `None`; the caller re-runs the lookup
    /// to learn the new id. A rejected creation is an error.
    pub async fn reconcile_site(&self, spec: &SiteSpec) -> Result<Option<ResourceId>, CoreError> {
        if let Some(id) = self.find_site_id(&spec.name).await.found() {
            info!(name = %spec.name, %id, "site already exists");
            return Ok(Some(id));
        }

        self.client().create_site(&spec.to_create()).await?;
        info!(name = %spec.name, "site created");
        Ok(None)
    }

    /// Return the id of the site named `spec.name`, creating it if needed.
    ///
    /// Uses the id echoed by the creation call when there is one, otherwise
    /// looks the site up once more. Only a conflict (another writer created
    /// the site between our lookup and our create) goes round again; an
    /// accepted create whose site cannot be listed is `NotFound`.
    pub async fn ensure_site(&self, spec: &SiteSpec) -> Result<ResourceId, CoreError> {
        for attempt in 1..=ENSURE_ATTEMPTS {
            if let Some(id) = self.find_site_id(&spec.name).await.into_result()? {
                info!(name = %spec.name, %id, "site already exists");
                return Ok(id);
            }

            match self.client().create_site(&spec.to_create()).await {
                Ok(Some(id)) => {
                    info!(name = %spec.name, %id, "site created");
                    return Ok(id);
                }
                Ok(None) => {
                    // The create was accepted; never post it a second time.
                    debug!(name = %spec.name, "create returned no id, looking it up");
                    let id = self.find_site_id(&spec.name).await.into_result()?;
                    return id
                        .inspect(|id| info!(name = %spec.name, %id, "site created"))
                        .ok_or_else(|| CoreError::NotFound {
                            entity: "Site".into(),
                            identifier: spec.name.clone(),
                        });
                }
                Err(e) if e.is_conflict() => {
                    warn!(name = %spec.name, attempt, "site creation conflicted, retrying lookup");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::NotFound {
            entity: "Site".into(),
            identifier: spec.name.clone(),
        })
    }
}
