// Nexpose v3 API resource types
//
// Collection endpoints wrap their payload in a `Page<T>` envelope with
// `resources`, `page` and HATEOAS `links`. Fields use `#[serde(default)]`
// liberally because the console omits empty values.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Identifier of any console resource.
///
/// Sites, scans and report configurations use integers; some history
/// instances use strings. Consumers only ever display or echo them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Numeric(i64),
    Text(String),
}

impl ResourceId {
    /// Equality on the rendered form, so `5` and `"5"` name the same resource.
    pub fn same_as(&self, other: &ResourceId) -> bool {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_owned()), Self::Numeric)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

// ── Envelope ─────────────────────────────────────────────────────────

/// A hypermedia link (`{ "href": "...", "rel": "self" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub rel: String,
}

/// Paging metadata of a collection response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub total_resources: i64,
}

/// Standard collection envelope.
///
/// ```json
/// { "resources": [...], "page": {...}, "links": [{ "rel": "last", "href": "..." }] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
    #[serde(default)]
    pub page: Option<PageInfo>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl<T> Page<T> {
    /// The `href` of the first link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == rel)
            .map(|l| l.href.as_str())
    }
}

/// Body returned by create/trigger endpoints: the new resource's id plus
/// links to it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub links: Vec<Link>,
}

// ── Sites ────────────────────────────────────────────────────────────

/// Site as listed by `GET /sites`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResource {
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scan_template: Option<String>,
    #[serde(default)]
    pub assets: Option<i64>,
}

/// Body of `POST /sites`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteCreate {
    pub name: String,
    pub description: String,
    pub scan: SiteScanScope,
    pub scan_template_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteScanScope {
    pub assets: SiteAssets,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAssets {
    pub included_targets: IncludedTargets,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncludedTargets {
    pub addresses: Vec<String>,
}

impl SiteCreate {
    /// A site scanning exactly one target address with the given template.
    pub fn single_target(
        name: impl Into<String>,
        description: impl Into<String>,
        address: impl Into<String>,
        scan_template_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            scan: SiteScanScope {
                assets: SiteAssets {
                    included_targets: IncludedTargets {
                        addresses: vec![address.into()],
                    },
                },
            },
            scan_template_id: scan_template_id.into(),
        }
    }
}

// ── Scans ────────────────────────────────────────────────────────────

/// Scan as returned by `GET /scans` and `GET /scans/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResource {
    pub id: ResourceId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub site_id: Option<ResourceId>,
    #[serde(default)]
    pub scan_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

// ── Reports ──────────────────────────────────────────────────────────

/// Which resources a report configuration covers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportScope {
    #[serde(default)]
    pub sites: Vec<ResourceId>,
}

/// Report configuration as listed by `GET /reports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub id: ResourceId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub scope: ReportScope,
}

impl ReportConfig {
    /// Whether this configuration's scope includes `site_id`.
    pub fn covers_site(&self, site_id: &ResourceId) -> bool {
        self.scope.sites.iter().any(|s| s.same_as(site_id))
    }
}

/// Body of `POST /reports`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfigCreate {
    pub name: String,
    pub format: String,
    pub scope: ReportScope,
    pub template: String,
}

/// One generation of a report (`GET /reports/{id}/history/{instance}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportHistory {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub generated: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}
