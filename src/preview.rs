//! Markdown fragments shown when hovering an image reference.

use crate::reference::Position;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use url::Url;

pub const OPEN_COMMAND: &str = "vscode.open";
pub const DOWNLOAD_COMMAND: &str = "imageview.downloadAndReplaceFromHover";

/// Arguments carried by the "Download & Replace" link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadArgs {
    pub url: String,
    pub document_uri: String,
    pub position: Position,
}

impl DownloadArgs {
    /// Parse the query part of a download command link. Accepts either the
    /// percent-encoded form or raw JSON.
    pub fn from_command_args(args: &str) -> Result<Self, serde_json::Error> {
        // Raw JSON is taken verbatim; escapes inside its strings are data.
        let raw_err = match serde_json::from_str(args) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => e,
        };
        match urlencoding::decode(args) {
            Ok(decoded) if decoded != args => serde_json::from_str(&decoded),
            _ => Err(raw_err),
        }
    }
}

/// Optional links rendered under the image.
#[derive(Debug, Clone, Default)]
pub struct PreviewActions {
    /// File URI opened by the "Open Image File" link.
    pub open: Option<String>,
    pub download: Option<DownloadArgs>,
}

/// Render an image preview followed by its action links.
///
/// The URI is embedded as-is; characters that break markdown image syntax
/// are not escaped.
pub fn render_preview(uri: &str, width: u32, actions: &PreviewActions) -> String {
    let mut markdown = format!("![preview]({}|width={})\n\n", uri, width);

    let mut links = Vec::new();
    if let Some(open) = &actions.open {
        links.push(format!(
            "[📂 Open Image File]({})",
            command_link(OPEN_COMMAND, open)
        ));
    }
    if let Some(download) = &actions.download {
        links.push(format!(
            "[📥 Download & Replace URL]({})",
            command_link(DOWNLOAD_COMMAND, download)
        ));
    }

    markdown.push_str(&links.join(" | "));
    markdown
}

pub fn render_load_failure(url: &str) -> String {
    format!("⚠️ **Could not load:** {}", url)
}

pub fn render_not_found(path: &str) -> String {
    format!("⚠️ Image not found: `{}`", path)
}

/// `command:<name>?<percent-encoded JSON>`
pub fn command_link<T: Serialize + ?Sized>(name: &str, args: &T) -> String {
    let json = serde_json::to_string(args).unwrap_or_else(|_| "null".to_string());
    format!("command:{}?{}", name, urlencoding::encode(&json))
}

/// `file://` URI for an absolute path.
pub fn file_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(|u| u.to_string())
}

#[derive(Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl EmbeddedImage {
    pub fn read(path: &Path) -> io::Result<Self> {
        let data = fs::read(path)?;
        let mime_type = guess_mime_type_from_path(path, &data);
        Ok(Self { data, mime_type })
    }

    pub fn to_data_url(&self) -> String {
        let b64 = STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.mime_type, b64)
    }
}

fn guess_mime_type_from_data(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.starts_with(b"RIFF") && data.len() > 12 && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        return Some("image/x-icon");
    }
    None
}

fn guess_mime_type_from_path(path: &Path, data: &[u8]) -> String {
    if let Some(mime) = guess_mime_type_from_data(data) {
        return mime.to_string();
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png".to_string(),
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("gif") => "image/gif".to_string(),
        Some("webp") => "image/webp".to_string(),
        Some("svg") => "image/svg+xml".to_string(),
        Some("ico") => "image/x-icon".to_string(),
        Some(other) => format!("image/{}", other),
        None => "application/octet-stream".to_string(),
    }
}
