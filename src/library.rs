//! The sidebar image grid.

use crate::preview::file_uri;
use std::path::{Path, PathBuf};

/// One thumbnail in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub path: PathBuf,
    /// Path shown under the thumbnail, relative to its workspace root.
    pub label: String,
}

impl LibraryEntry {
    pub fn new(path: PathBuf, roots: &[PathBuf]) -> Self {
        let label = relative_label(&path, roots);
        Self { path, label }
    }
}

/// `path` relative to the first root containing it, with `/` separators.
/// Paths outside every root are shown in full.
pub fn relative_label(path: &Path, roots: &[PathBuf]) -> String {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|| path.display().to_string())
}

pub fn render_library(entries: &[LibraryEntry], thumbnail_width: u32) -> String {
    let mut html = String::new();
    html.push_str("<html>\n<body style=\"padding: 10px; font-family: sans-serif;\">\n");
    html.push_str("<button onclick=\"refresh()\">🔄 Refresh</button>\n");
    html.push_str(&format!(
        "<div style=\"display: grid; grid-template-columns: repeat(auto-fill, {}px); gap: 10px; margin-top: 10px;\">\n",
        thumbnail_width + 20
    ));

    for entry in entries {
        let src = file_uri(&entry.path).unwrap_or_else(|| entry.path.display().to_string());
        let path_arg = serde_json::to_string(&entry.path.to_string_lossy())
            .unwrap_or_else(|_| "\"\"".to_string());
        html.push_str("<div style=\"text-align: center;\">");
        html.push_str(&format!(
            "<a onclick=\"openImage({})\"><img src=\"{}\" width=\"{}\" style=\"border: 1px solid #ccc;\"/></a>",
            html_escape(&path_arg),
            html_escape(&src),
            thumbnail_width
        ));
        html.push_str(&format!(
            "<div style=\"font-size: 10px; overflow: hidden;\">{}</div>",
            html_escape(&entry.label)
        ));
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n");
    html.push_str(
        "<script>\n\
         const vscode = acquireVsCodeApi();\n\
         function refresh() { vscode.postMessage({ command: 'refresh' }); }\n\
         function openImage(path) { vscode.postMessage({ command: 'open', path }); }\n\
         </script>\n",
    );
    html.push_str("</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
