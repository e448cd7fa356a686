//! JSON file store with atomic replace.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lyricsweep_core::RetryState;

use super::RetryStateStore;
use crate::cancel::{self, Cancelled, or_cancel};

pub const STATE_FILE_NAME: &str = "retry-state.json";

/// Persists the state as one JSON document.
///
/// Writes go to a `.tmp` sibling which is flushed, synced and renamed over
/// the target, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileRetryStateStore {
    path: PathBuf,
}

impl FileRetryStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<base>/plugins/lyrics/retry-state.json`.
    pub fn in_data_dir(base: impl AsRef<Path>) -> Self {
        Self::new(
            base.as_ref()
                .join("plugins")
                .join("lyrics")
                .join(STATE_FILE_NAME),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| STATE_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read(&self) -> anyhow::Result<Option<RetryState>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(state))
    }

    async fn write(&self, bytes: &[u8]) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create state directory {}", dir.display()))?;
        }

        let tmp = self.temp_path();
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        file.flush().await?;
        file.sync_all()
            .await
            .with_context(|| format!("failed to sync {}", tmp.display()))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    async fn discard_temp(&self) {
        let _ = tokio::fs::remove_file(self.temp_path()).await;
    }
}

#[async_trait]
impl RetryStateStore for FileRetryStateStore {
    async fn load(&self, cancel: &CancellationToken) -> Result<RetryState, Cancelled> {
        match or_cancel(self.read(), cancel).await? {
            Ok(Some(state)) => {
                debug!(
                    path = %self.path.display(),
                    entries = state.entries.len(),
                    cursor = state.cursor,
                    "loaded retry state"
                );
                Ok(state)
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no retry state yet");
                Ok(RetryState::new())
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "failed to load retry state, using empty state"
                );
                Ok(RetryState::new())
            }
        }
    }

    async fn save(&self, state: &RetryState, cancel: &CancellationToken) -> Result<(), Cancelled> {
        cancel::check(cancel)?;

        let bytes = match serde_json::to_vec(state) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to serialize retry state");
                return Ok(());
            }
        };

        match or_cancel(self.write(&bytes), cancel).await {
            Ok(Ok(())) => {
                debug!(
                    path = %self.path.display(),
                    entries = state.entries.len(),
                    cursor = state.cursor,
                    "saved retry state"
                );
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "failed to save retry state"
                );
                self.discard_temp().await;
                Ok(())
            }
            Err(Cancelled) => {
                self.discard_temp().await;
                Err(Cancelled)
            }
        }
    }
}
