use crate::cleanup::CleanupRegistry;
use crate::fetch::{FetchError, Fetcher};
use crate::reference::url_extension;
use log::{debug, trace};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Prefix of every scratch file name.
pub const TEMP_FILE_PREFIX: &str = "imageview_";

/// Maps a remote URL (exact string) to its downloaded copy for the lifetime of
/// the process. Entries are never refreshed or invalidated, so a cached path
/// may point at a file that has since been removed.
///
/// The lock is not held while fetching: two concurrent resolves of the same
/// uncached URL both download, and the later insert wins.
#[derive(Debug)]
pub struct ReferenceCache {
    scratch_dir: PathBuf,
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl ReferenceCache {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn get(&self, url: &str) -> Option<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Local path for `url`, downloading it on first use.
    pub fn resolve<F: Fetcher + ?Sized>(
        &self,
        url: &str,
        fetcher: &F,
        cleanup: &CleanupRegistry,
    ) -> Result<PathBuf, FetchError> {
        if let Some(path) = self.get(url) {
            trace!("Image cache hit: {}", url);
            return Ok(path);
        }

        let dest = self.temp_path_for(url);
        debug!("Image cache miss: {} -> {:?}", url, dest);
        fetcher.fetch(url, &dest)?;

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), dest.clone());
        cleanup.register(dest.clone());
        Ok(dest)
    }

    /// A fresh `imageview_<uuid><ext>` path in the scratch directory.
    pub fn temp_path_for(&self, url: &str) -> PathBuf {
        let name = format!("{}{}{}", TEMP_FILE_PREFIX, Uuid::new_v4(), url_extension(url));
        self.scratch_dir.join(name)
    }
}
