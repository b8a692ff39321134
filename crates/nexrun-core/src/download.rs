// ── Artifact download ──
//
// Streams a generated report into local storage. Where the bytes land is
// decided by `artifact_path`; how they are written is behind
// `ArtifactStore` so the pipeline can target any root directory.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use nexrun_api::ResourceId;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::session::Session;

/// Directory used when no timestamp/address pair is available.
pub const DEFAULT_REPORT_DIR: &str = "reports";
/// File name used when none is configured.
pub const DEFAULT_REPORT_FILENAME: &str = "report.pdf";

/// Relative path a report is saved to.
///
/// `{directory}_{address}/{filename}` when both parts are known, otherwise
/// `reports/{filename}`. Path separators inside the directory parts are
/// replaced so the result is always exactly one directory deep.
pub fn artifact_path(directory: Option<&str>, address: Option<&str>, filename: &str) -> PathBuf {
    let dir = match (directory, address) {
        (Some(directory), Some(address)) => {
            format!("{directory}_{address}").replace(['/', '\\'], "_")
        }
        _ => DEFAULT_REPORT_DIR.to_owned(),
    };
    let filename = if filename.is_empty() {
        DEFAULT_REPORT_FILENAME
    } else {
        filename
    };
    Path::new(&dir).join(filename)
}

/// Destination for downloaded artifacts.
pub trait ArtifactStore: Send + Sync {
    type Writer: AsyncWrite + Unpin + Send;

    /// Open `relative` for writing, creating the directories it needs.
    /// Returns the resolved path together with the writer.
    fn create(
        &self,
        relative: &Path,
    ) -> impl Future<Output = io::Result<(PathBuf, Self::Writer)>> + Send;

    /// Remove a partially written artifact.
    fn discard(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;
}

/// Artifact store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsArtifactStore {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ArtifactStore for FsArtifactStore {
    type Writer = tokio::fs::File;

    async fn create(&self, relative: &Path) -> io::Result<(PathBuf, Self::Writer)> {
        let path = self.root.join(relative);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let file = tokio::fs::File::create(&path).await?;
        Ok((path, file))
    }

    async fn discard(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

impl Session {
    /// Download history `instance` of `report_id` into `relative` under `store`.
    ///
    /// Only an exact `200 OK` is written; anything else is a failure and
    /// creates nothing. Returns the path written.
    pub async fn download_report<S: ArtifactStore>(
        &self,
        report_id: &ResourceId,
        instance: &str,
        relative: &Path,
        store: &S,
    ) -> Result<PathBuf, CoreError> {
        let mut output = match self.client().open_report_output(report_id, instance).await {
            Ok(output) => output,
            Err(nexrun_api::Error::Api { status, message }) => {
                warn!(%report_id, status, "report download refused");
                return Err(CoreError::DownloadFailed {
                    message: format!("HTTP {status}: {message}"),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let (path, mut writer) = store.create(relative).await?;
        debug!(%report_id, path = %path.display(), size = ?output.content_length(), "writing report");

        let mut written: usize = 0;
        let streamed: Result<(), CoreError> = async {
            while let Some(chunk) = output.next_chunk().await? {
                writer.write_all(&chunk).await?;
                written += chunk.len();
            }
            writer.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            drop(writer);
            if let Err(cleanup) = store.discard(&path).await {
                warn!(path = %path.display(), error = %cleanup, "could not remove partial report");
            }
            return Err(CoreError::DownloadFailed {
                message: e.to_string(),
            });
        }

        info!(%report_id, path = %path.display(), bytes = written, "report downloaded");
        Ok(path)
    }
}
