use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use mediakeep_types::BlobKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// Configuration for the filesystem blob store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FsBlobConfig {
    /// Root directory for payload files.
    pub root: PathBuf,
}

impl Default for FsBlobConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("blobs"),
        }
    }
}

/// Filesystem blob store: one file per key.
///
/// Files are sharded into subdirectories by the first two characters of
/// the key to keep directory fan-out bounded. Writes go to a temporary
/// file first and are renamed into place, so a concurrent reader never
/// observes a partial payload.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at the configured directory, creating it if
    /// necessary.
    pub fn open(config: FsBlobConfig) -> BlobResult<Self> {
        fs::create_dir_all(&config.root)?;
        Ok(Self { root: config.root })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        let name = key.as_uuid().simple().to_string();
        self.root.join(&name[..2]).join(name)
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, reader: &mut dyn Read) -> BlobResult<BlobKey> {
        let key = BlobKey::generate();
        let name = key.as_uuid().simple().to_string();
        let shard = self.root.join(&name[..2]);
        fs::create_dir_all(&shard)?;
        let path = shard.join(&name);

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        std::io::copy(reader, &mut file)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &path)?;

        debug!(%key, path = %path.display(), "stored blob");
        Ok(key)
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Bytes> {
        let path = self.blob_path(key);
        match fs::read(&path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(*key))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    fn delete(&self, key: &BlobKey) -> BlobResult<()> {
        let path = self.blob_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(*key))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    fn exists(&self, key: &BlobKey) -> BlobResult<bool> {
        Ok(self.blob_path(key).exists())
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .finish()
    }
}
