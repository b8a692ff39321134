// Nexpose v3 API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, basic-auth signing and
// status interpretation. Endpoint groups (sites, scans, reports) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::collections::HashSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::BasicCredentials;
use crate::error::Error;
use crate::models::{Page, Reference};
use crate::transport::TransportConfig;

/// Error body shape used by the console (`{"status": 404, "message": "..."}`).
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Statuses the console uses to acknowledge configuration calls.
pub fn is_accepted(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 200..=202)
}

/// Async client for the console's v3 REST API.
///
/// Cheap to clone; clones share the underlying connection pool. Never
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct NexposeClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: BasicCredentials,
}

impl NexposeClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `api_url` (e.g. `https://console:3780/api/3`).
    pub fn new(
        api_url: &str,
        credentials: BasicCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(api_url, http, credentials)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        api_url: &str,
        http: reqwest::Client,
        credentials: BasicCredentials,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(api_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Ensure the base URL ends with `/` so relative joins append rather
    /// than replace the last path segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The API root every endpoint is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"sites/4/scans"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.credentials.sign(self.http.get(url)).send().await?;
        Self::handle_response(resp).await
    }

    /// GET without status interpretation, for binary downloads.
    pub(crate) async fn get_raw(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {url} (raw)");

        Ok(self.credentials.sign(self.http.get(url)).send().await?)
    }

    /// POST an optional JSON body to a create/trigger endpoint.
    ///
    /// Returns the reference the console answered with, or `None` when the
    /// acknowledgement carried no parseable body.
    pub(crate) async fn post_reference<B: Serialize + Sync>(
        &self,
        url: Url,
        body: Option<&B>,
    ) -> Result<Option<Reference>, Error> {
        debug!("POST {url}");

        let mut request = self.credentials.sign(self.http.post(url));
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;

        let status = resp.status();
        if !is_accepted(status) {
            return Err(Self::parse_error(status, resp).await);
        }

        let raw = resp.text().await?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Reference>(&raw) {
            Ok(reference) => Ok(Some(reference)),
            Err(e) => {
                trace!(error = %e, "acknowledgement body is not a reference");
                Ok(None)
            }
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if is_accepted(status) {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    pub(crate) async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => {
                return Error::Authentication {
                    message: "console rejected the API credentials".into(),
                };
            }
            reqwest::StatusCode::FORBIDDEN => {
                return Error::Authentication {
                    message: "account is not permitted to use this endpoint".into(),
                };
            }
            _ => {}
        }

        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(ErrorResponse { message: Some(m) }) => m,
            _ if raw.is_empty() => status.to_string(),
            _ => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ── Pagination helpers ───────────────────────────────────────────

    /// Fetch one page of a collection from an absolute `href`.
    pub async fn get_page<T: DeserializeOwned>(&self, href: &str) -> Result<Page<T>, Error> {
        let url = Url::parse(href)?;
        self.get(url).await
    }

    /// Collect every page of a collection by following `next` links.
    ///
    /// A link that was already visited ends the walk, so a console that
    /// points `next` back at itself cannot loop us forever.
    pub async fn collect_pages<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>, Error> {
        let mut all = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(first.to_string());

        let mut page: Page<T> = self.get(first).await?;
        loop {
            let next = page.link("next").map(str::to_owned);
            all.extend(page.resources);

            let Some(href) = next else { break };
            if !visited.insert(href.clone()) {
                break;
            }
            page = self.get_page(&href).await?;
        }

        Ok(all)
    }
}
