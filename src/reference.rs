use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Extensions recognised inside a quoted literal. Matching is case-sensitive.
const LITERAL_EXTENSIONS: &str = "png|jpg|jpeg|gif|svg|webp|ico";

static ANY_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    let ext = LITERAL_EXTENSIONS;
    Regex::new(&format!(
        r#""([^'"]+\.(?:{ext}))"|'([^'"]+\.(?:{ext}))'"#
    ))
    .expect("literal pattern is valid")
});

static REMOTE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    let ext = LITERAL_EXTENSIONS;
    Regex::new(&format!(
        r#""(https?://[^'"]+\.(?:{ext}))"|'(https?://[^'"]+\.(?:{ext}))'"#
    ))
    .expect("remote literal pattern is valid")
});

/// Zero-based line and column. Columns count Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A single-line span in a document, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

/// What a quoted literal points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    LocalPath(String),
    RemoteUrl(String),
}

impl ImageReference {
    pub fn classify(value: &str) -> Self {
        if is_remote_url(value) {
            ImageReference::RemoteUrl(value.to_string())
        } else {
            ImageReference::LocalPath(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageReference::LocalPath(s) | ImageReference::RemoteUrl(s) => s,
        }
    }
}

/// A quoted literal found under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedReference {
    /// Range of the literal including its quotes.
    pub range: TextRange,
    pub reference: ImageReference,
}

pub fn is_remote_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Find any quoted image path or URL enclosing `position`.
pub fn reference_at(text: &str, position: Position) -> Option<MatchedReference> {
    literal_at(text, position, &ANY_LITERAL)
}

/// Like [`reference_at`], but only matches `http(s)://` literals.
pub fn remote_reference_at(text: &str, position: Position) -> Option<MatchedReference> {
    literal_at(text, position, &REMOTE_LITERAL)
}

fn literal_at(text: &str, position: Position, pattern: &Regex) -> Option<MatchedReference> {
    let line = line_at(text, position.line)?;

    for caps in pattern.captures_iter(line) {
        let whole = caps.get(0)?;
        let start = line[..whole.start()].chars().count();
        let end = start + whole.as_str().chars().count();
        if start <= position.character && position.character <= end {
            let value = caps.get(1).or_else(|| caps.get(2))?.as_str();
            trace!("Matched literal {:?} at {}:{}", value, position.line, start);
            return Some(MatchedReference {
                range: TextRange {
                    start: Position::new(position.line, start),
                    end: Position::new(position.line, end),
                },
                reference: ImageReference::classify(value),
            });
        }
    }
    None
}

fn line_at(text: &str, line: usize) -> Option<&str> {
    text.split('\n')
        .nth(line)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Replace a single-line range in `text`. Returns `None` if the range is
/// outside the document.
pub fn replace_range(text: &str, range: TextRange, replacement: &str) -> Option<String> {
    if range.start.line != range.end.line || range.start.character > range.end.character {
        return None;
    }

    let mut line_start = 0;
    for _ in 0..range.start.line {
        line_start += text[line_start..].find('\n')? + 1;
    }
    let line_end = text[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(text.len());
    let line = &text[line_start..line_end];

    let start = line_start + char_to_byte(line, range.start.character)?;
    let end = line_start + char_to_byte(line, range.end.character)?;

    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    Some(out)
}

fn char_to_byte(line: &str, character: usize) -> Option<usize> {
    if character == line.chars().count() {
        return Some(line.len());
    }
    line.char_indices().nth(character).map(|(i, _)| i)
}

/// The extension a URL appears to have, with its leading dot, or `.png`.
pub fn url_extension(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or(url);
    let ext = match segment.rfind('.') {
        Some(i) if i > 0 => &segment[i..],
        _ => "",
    };
    let ext = ext.split(['?', '#']).next().unwrap_or("");
    if ext.is_empty() {
        ".png".to_string()
    } else {
        ext.to_string()
    }
}
