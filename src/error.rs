use crate::fetch::FetchError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageViewError {
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("Failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to scan for images: {0}")]
    Walk(#[from] walkdir::Error),
}
