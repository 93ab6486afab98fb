use crate::error::ImageViewError;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions (lowercase, no dot) shown in the image library.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "ico", "svg"];

/// Recursively collect image files under each root.
///
/// Symlinks are followed. A link that points back at one of its own ancestors
/// is skipped, so cyclic trees still terminate. Any other walk error,
/// including an unreadable root, aborts the whole walk.
pub fn find_images(roots: &[PathBuf]) -> Result<Vec<PathBuf>, ImageViewError> {
    let mut files = Vec::new();
    for root in roots {
        collect_images(root, &mut files)?;
    }
    Ok(files)
}

fn collect_images(root: &Path, files: &mut Vec<PathBuf>) -> Result<(), ImageViewError> {
    let root = std::path::absolute(root).map_err(|source| ImageViewError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let before = files.len();

    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                warn!("Skipping symlink cycle at {:?}", e.path());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} image(s) under {:?}", files.len() - before, root);
    Ok(())
}

pub fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ref ext) if IMAGE_EXTENSIONS.contains(&ext.as_str())
    )
}
