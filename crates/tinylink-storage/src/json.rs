use async_trait::async_trait;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tinylink_core::store::Result;
use tinylink_core::{ShortLinkRecord, StorageError, Store};
use tracing::{debug, info};

/// Keeps the record set as a pretty-printed JSON array in a single file.
///
/// Timestamps are written as RFC 3339 strings at full precision. A missing
/// file loads as an empty set. Saves write a uniquely named temporary file
/// next to the target and rename it over the target, so a crash mid-save
/// leaves the previous contents intact.
///
/// Several processes sharing one file must serialize their
/// load-modify-save cycles with [`JsonFileStore::lock`].
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Exclusive advisory lock on a [`JsonFileStore`]'s file, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sibling file the advisory lock is taken on. The data file itself
    /// is replaced on every save, so it cannot carry the lock.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn parent(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Waits until no other holder, in this or another process, has the
    /// file locked, then locks it until the returned guard is dropped.
    pub async fn lock(&self) -> Result<StoreLock> {
        let parent = self.parent().to_path_buf();
        let lock_path = self.lock_path();

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            std::fs::create_dir_all(&parent)?;
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| StorageError::Io(e.to_string()))??;

        debug!(path = %self.path.display(), "locked link file");
        Ok(StoreLock { _file: file })
    }
}

fn map_json_error(err: serde_json::Error) -> StorageError {
    match err.classify() {
        serde_json::error::Category::Data => StorageError::InvalidData(err.to_string()),
        _ => StorageError::Serialization(err.to_string()),
    }
}

fn write_atomically(parent: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(parent)?;
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> Result<Vec<ShortLinkRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "link file does not exist yet, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<ShortLinkRecord> =
            serde_json::from_str(&content).map_err(map_json_error)?;

        info!(path = %self.path.display(), count = records.len(), "loaded short links");
        Ok(records)
    }

    async fn save(&self, records: &[ShortLinkRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records).map_err(map_json_error)?;
        let parent = self.parent().to_path_buf();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&parent, &path, &json))
            .await
            .map_err(|e| StorageError::Io(e.to_string()))??;

        debug!(path = %self.path.display(), count = records.len(), "saved short links");
        Ok(())
    }
}
