use log::{debug, trace};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use ureq::Agent;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-200 status, or a missing/non-image content type.
    #[error("Invalid response: {0}")]
    InvalidResponse(u16),
    #[error("Failed to fetch '{url}': {reason}")]
    Network { url: String, reason: String },
    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Downloads a URL into a file.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Blocking HTTP(S) fetcher. Redirects are followed by the agent; there is
/// no timeout, no retry and no size limit.
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let file = File::create(dest).map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        let result = self.stream_to(url, dest, file);
        if result.is_err() {
            discard_partial(dest);
        }
        result
    }
}

impl HttpFetcher {
    fn stream_to(&self, url: &str, dest: &Path, mut file: File) -> Result<(), FetchError> {
        debug!("Fetching remote image: {}", url);

        let response = self.agent.get(url).call().map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("Content-Type")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");
        trace!("HTTP {} for {} ({})", status, url, content_type);

        if status != 200 || !content_type.starts_with("image/") {
            return Err(FetchError::InvalidResponse(status));
        }

        let mut body = response.into_body().into_reader();
        let written = io::copy(&mut body, &mut file).map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        file.sync_all().map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        trace!("Wrote {} bytes to {:?}", written, dest);
        Ok(())
    }
}

/// Fire-and-forget removal of a partial download. Failures are ignored on purpose.
fn discard_partial(dest: &Path) {
    if let Err(e) = fs::remove_file(dest) {
        trace!("Could not remove partial download {:?}: {}", dest, e);
    }
}
