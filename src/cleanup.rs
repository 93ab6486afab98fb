use log::{debug, trace};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Temporary files created during the session, deleted at shutdown.
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    paths: Mutex<Vec<PathBuf>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: PathBuf) {
        trace!("Registered temp file {:?}", path);
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }

    pub fn len(&self) -> usize {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every registered path. Deletion failures are swallowed: this is
    /// fire-and-forget cleanup and has nothing to report.
    pub fn drain_and_delete(&self) {
        let paths = std::mem::take(
            &mut *self
                .paths
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        debug!("Removing {} temp file(s)", paths.len());
        for path in paths {
            if let Err(e) = fs::remove_file(&path) {
                trace!("Ignoring failure to remove {:?}: {}", path, e);
            }
        }
    }
}
