use crate::cache::ReferenceCache;
use crate::cleanup::CleanupRegistry;
use crate::config::Config;
use crate::error::ImageViewError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::finder::find_images;
use crate::library::{LibraryEntry, render_library};
use crate::preview::{
    DownloadArgs, EmbeddedImage, PreviewActions, file_uri, render_load_failure, render_not_found,
    render_preview,
};
use crate::reference::{
    ImageReference, Position, TextRange, reference_at, remote_reference_at, replace_range,
    url_extension,
};
use log::{debug, info, trace, warn};
use pathdiff::diff_paths;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Hover contents and the range they apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub contents: String,
    pub range: TextRange,
}

/// Edit produced by a successful download-and-replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: TextRange,
    /// Quoted `"./<relative>"` literal.
    pub new_text: String,
    /// Target path relative to its workspace root, `/`-separated.
    pub relative_path: String,
    pub target: PathBuf,
}

impl Replacement {
    pub fn apply(&self, text: &str) -> Option<String> {
        replace_range(text, self.range, &self.new_text)
    }
}

/// Process-wide state: the remote image cache, the temp-file registry and the
/// fetcher. Construct once and pass by reference.
pub struct ImageView<F: Fetcher = HttpFetcher> {
    config: Config,
    fetcher: F,
    cache: ReferenceCache,
    cleanup: CleanupRegistry,
}

impl ImageView<HttpFetcher> {
    pub fn new(config: Config) -> Self {
        Self::with_fetcher(config, HttpFetcher::new())
    }
}

impl<F: Fetcher> ImageView<F> {
    pub fn with_fetcher(config: Config, fetcher: F) -> Self {
        let cache = ReferenceCache::new(config.temp_dir.clone());
        Self {
            config,
            fetcher,
            cache,
            cleanup: CleanupRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    pub fn cleanup(&self) -> &CleanupRegistry {
        &self.cleanup
    }

    /// Preview for the image literal under `position`, if any.
    ///
    /// Load failures are reported inside the returned markdown rather than as
    /// errors.
    pub fn hover(&self, document: &Path, text: &str, position: Position) -> Option<Hover> {
        let matched = reference_at(text, position)?;
        debug!("Hover detected on: {}", matched.reference.as_str());

        let contents = match &matched.reference {
            ImageReference::RemoteUrl(url) => self.remote_preview(url, document, position),
            ImageReference::LocalPath(path) => self.local_preview(path, document),
        };
        Some(Hover {
            contents,
            range: matched.range,
        })
    }

    fn remote_preview(&self, url: &str, document: &Path, position: Position) -> String {
        if let Err(e) = fs::create_dir_all(self.cache.scratch_dir()) {
            trace!("Could not create {:?}: {}", self.cache.scratch_dir(), e);
        }

        let local = match self.cache.resolve(url, &self.fetcher, &self.cleanup) {
            Ok(path) => path,
            Err(e) => {
                warn!("{}", e);
                return render_load_failure(url);
            }
        };
        let Some(uri) = file_uri(&local) else {
            return render_load_failure(url);
        };

        let document = absolute(document);
        let actions = PreviewActions {
            open: Some(uri.clone()),
            download: Some(DownloadArgs {
                url: url.to_string(),
                document_uri: file_uri(&document)
                    .unwrap_or_else(|| document.display().to_string()),
                position,
            }),
        };
        render_preview(&uri, self.config.preview_width, &actions)
    }

    fn local_preview(&self, reference: &str, document: &Path) -> String {
        let base_dir = absolute(document)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let path = normalize(&base_dir.join(reference));
        trace!("Resolved {:?} to {:?}", reference, path);

        if path.exists()
            && let Some(uri) = file_uri(&path)
        {
            let actions = PreviewActions {
                open: Some(uri.clone()),
                download: None,
            };
            return render_preview(&uri, self.config.preview_width, &actions);
        }

        match load_local(&path) {
            Ok(img) => render_preview(
                &img.to_data_url(),
                self.config.preview_width,
                &PreviewActions::default(),
            ),
            Err(e) => {
                debug!("{}", e);
                render_not_found(reference)
            }
        }
    }

    /// The configured root containing `document`, preferring the deepest.
    pub fn workspace_root_for(&self, document: &Path) -> Option<PathBuf> {
        let document = normalize(&absolute(document));
        self.roots()
            .into_iter()
            .filter(|root| document.starts_with(root))
            .max_by_key(|root| root.components().count())
    }

    /// `<root>/<images_dir>/image<ext>`
    pub fn default_download_target(&self, root: &Path, url: &str) -> PathBuf {
        root.join(&self.config.images_dir)
            .join(format!("image{}", url_extension(url)))
    }

    /// Download the remote image literal at `position` into the workspace and
    /// compute the edit that points the literal at the saved copy.
    ///
    /// Returns `Ok(None)` when there is nothing to do: no remote literal at
    /// the position, or the document is outside every workspace root.
    pub fn download_and_replace(
        &self,
        args: &DownloadArgs,
        document: &Path,
        text: &str,
        target: Option<&Path>,
    ) -> Result<Option<Replacement>, ImageViewError> {
        let Some(matched) = remote_reference_at(text, args.position) else {
            debug!("No remote image literal at {:?}", args.position);
            return Ok(None);
        };
        let Some(root) = self.workspace_root_for(document) else {
            debug!("{:?} is not inside a workspace root", document);
            return Ok(None);
        };

        let target = match target {
            Some(t) => normalize(&absolute(t)),
            None => self.default_download_target(&root, &args.url),
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ImageViewError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        self.fetcher.fetch(&args.url, &target)?;

        let relative_path = diff_paths(&target, &root)
            .unwrap_or_else(|| target.clone())
            .to_string_lossy()
            .replace('\\', "/");
        info!("Saved {} to {:?}", args.url, target);

        Ok(Some(Replacement {
            range: matched.range,
            new_text: format!("\"./{}\"", relative_path),
            relative_path,
            target,
        }))
    }

    /// Every image file under the configured roots. Always a full re-walk.
    pub fn list_images(&self) -> Result<Vec<PathBuf>, ImageViewError> {
        find_images(&self.roots())
    }

    /// HTML for the image library, or an empty string with no roots.
    pub fn library(&self) -> Result<String, ImageViewError> {
        if self.config.roots.is_empty() {
            return Ok(String::new());
        }
        let roots = self.roots();
        let entries: Vec<LibraryEntry> = find_images(&roots)?
            .into_iter()
            .map(|path| LibraryEntry::new(path, &roots))
            .collect();
        Ok(render_library(&entries, self.config.thumbnail_width))
    }

    /// Configured roots, absolute and without `.`/`..` components.
    fn roots(&self) -> Vec<PathBuf> {
        self.config
            .roots
            .iter()
            .map(|root| normalize(&absolute(root)))
            .collect()
    }

    /// Delete temporary downloads. Call once, at shutdown.
    pub fn shutdown(&self) {
        if self.config.keep_temp_files {
            debug!("Keeping {} temp file(s)", self.cleanup.len());
            return;
        }
        self.cleanup.drain_and_delete();
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Read a local image for embedding.
fn load_local(path: &Path) -> Result<EmbeddedImage, ImageViewError> {
    EmbeddedImage::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ImageViewError::NotFound(path.display().to_string()),
        _ => ImageViewError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}
