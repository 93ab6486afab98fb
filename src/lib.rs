//! Inline previews for image paths and URLs in text documents, plus a
//! workspace image library.

pub mod cache;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod fetch;
pub mod finder;
pub mod library;
pub mod preview;
pub mod reference;
pub mod service;

pub use config::Config;
pub use error::ImageViewError;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use reference::{ImageReference, Position, TextRange};
pub use service::{Hover, ImageView, Replacement};
