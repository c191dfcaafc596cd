//! File System Host Bridge
//!
//! Persists each key as a UTF-8 file under a base directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::traits::HubStorage;
use crate::storage::backend::{StorageError, StorageResult};

const ITEM_PREFIX: &str = "k_";
const ITEM_SUFFIX: &str = ".item";

/// Distinguishes temp files of concurrent writes within this process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// File system host bridge
///
/// Each key is percent-encoded into its own `k_<key>.item` file directly
/// under the base path, so distinct keys never share a file and no key can
/// escape the directory. Writes go through a per-write temp file and a
/// rename so a reader never sees a torn value.
#[derive(Debug)]
pub struct FileHubStorage {
    base_path: PathBuf,
}

impl FileHubStorage {
    /// Create a new file bridge
    ///
    /// # Arguments
    /// * `base_path` - Directory holding one file per key
    pub fn new<P: AsRef<Path>>(base_path: P) -> StorageResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        // Constructor is sync, so create the directory synchronously
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a key to a full file path
    fn key_to_path(&self, key: &str) -> PathBuf {
        self.base_path.join(item_file_name(key))
    }
}

#[async_trait]
impl HubStorage for FileHubStorage {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_to_path(key);

        match fs::read(&path).await {
            Ok(bytes) => {
                // Anything that is not valid UTF-8 is not a string, so it
                // reads as absent
                Ok(String::from_utf8(bytes).ok())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> StorageResult<()> {
        let file_name = item_file_name(key);
        let path = self.base_path.join(&file_name);
        let temp_path = self.base_path.join(format!(
            "{}.{}-{}.tmp",
            file_name,
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &path).await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }
        debug!("Wrote {} bytes for key '{}'", value.len(), key);

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()), // Idempotent delete
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn clear(&self) -> StorageResult<()> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut removed = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let is_item = entry
                .file_name()
                .to_str()
                .map_or(false, is_item_file_name);
            if is_item && entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        debug!("Cleared {} item(s) from {}", removed, self.base_path.display());
        Ok(())
    }
}

/// File name holding `key`. Percent-encoding is injective and leaves no
/// separators, so the empty key and keys like `a/b` get their own files.
fn item_file_name(key: &str) -> String {
    format!("{}{}{}", ITEM_PREFIX, urlencoding::encode(key), ITEM_SUFFIX)
}

fn is_item_file_name(name: &str) -> bool {
    name.starts_with(ITEM_PREFIX) && name.ends_with(ITEM_SUFFIX)
}
