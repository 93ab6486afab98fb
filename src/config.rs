use log::{debug, trace};
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration loaded from file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub roots: Option<Vec<String>>,
    pub temp_dir: Option<String>,
    pub images_dir: Option<String>,
    pub preview_width: Option<u32>,
    pub thumbnail_width: Option<u32>,
    pub keep_temp_files: Option<bool>,
}

/// Resolved configuration with all sources merged
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace roots scanned by the image library and used as download targets.
    pub roots: Vec<PathBuf>,
    /// Scratch directory for hover downloads.
    pub temp_dir: PathBuf,
    /// Directory under a root where downloaded images are saved by default.
    pub images_dir: String,
    pub preview_width: u32,
    pub thumbnail_width: u32,
    /// Skip deleting hover downloads at shutdown.
    pub keep_temp_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            temp_dir: std::env::temp_dir(),
            images_dir: "images".to_string(),
            preview_width: 200,
            thumbnail_width: 80,
            keep_temp_files: false,
        }
    }
}

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.toml"))
}

/// Get the default config directory
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_local_dir().map(|p| p.join("imageview"))
}

/// Load configuration from a TOML file
pub fn load_config_file(path: &PathBuf) -> Option<FileConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to read config file {:?}: {}", path, e);
            } else {
                trace!("No config file at {:?}", path);
            }
            None
        }
    }
}

/// Load a setting from environment variable
fn env_var(name: &str) -> Option<String> {
    let key = format!("IMAGEVIEW_{}", name.to_uppercase());
    std::env::var(&key).ok().map(|v| {
        trace!("Found env var {}={}", key, v);
        v
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Roots in an environment variable are separated like `PATH`.
fn parse_roots(s: &str) -> Vec<PathBuf> {
    std::env::split_paths(s)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// CLI argument values (None/empty means not specified)
#[derive(Debug, Default)]
pub struct CliArgs {
    pub roots: Vec<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub images_dir: Option<String>,
    pub preview_width: Option<u32>,
    pub keep_temp_files: Option<bool>,
}

impl Config {
    /// Build configuration with precedence: CLI > env vars > config file > defaults
    #[allow(clippy::field_reassign_with_default)]
    pub fn build(cli: CliArgs, config_path: Option<PathBuf>) -> Self {
        let mut config = Config::default();

        // Load config file (lowest priority after defaults)
        let file_config = config_path
            .or_else(default_config_path)
            .and_then(|p| load_config_file(&p))
            .unwrap_or_default();

        // Apply config file values
        if let Some(v) = file_config.roots {
            config.roots = v.into_iter().map(PathBuf::from).collect();
        }
        if let Some(v) = file_config.temp_dir {
            config.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = file_config.images_dir {
            config.images_dir = v;
        }
        if let Some(v) = file_config.preview_width {
            config.preview_width = v;
        }
        if let Some(v) = file_config.thumbnail_width {
            config.thumbnail_width = v;
        }
        if let Some(v) = file_config.keep_temp_files {
            config.keep_temp_files = v;
        }

        // Apply environment variables (higher priority than config file)
        if let Some(v) = env_var("roots") {
            config.roots = parse_roots(&v);
        }
        if let Some(v) = env_var("temp_dir") {
            config.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("images_dir") {
            config.images_dir = v;
        }
        if let Some(v) = env_var("preview_width").and_then(|s| s.parse().ok()) {
            config.preview_width = v;
        }
        if let Some(v) = env_var("thumbnail_width").and_then(|s| s.parse().ok()) {
            config.thumbnail_width = v;
        }
        if let Some(v) = env_var("keep_temp_files").and_then(|s| parse_bool(&s)) {
            config.keep_temp_files = v;
        }

        // Apply CLI arguments (highest priority)
        if !cli.roots.is_empty() {
            config.roots = cli.roots;
        }
        if let Some(v) = cli.temp_dir {
            config.temp_dir = v;
        }
        if let Some(v) = cli.images_dir {
            config.images_dir = v;
        }
        if let Some(v) = cli.preview_width {
            config.preview_width = v;
        }
        if let Some(v) = cli.keep_temp_files {
            config.keep_temp_files = v;
        }

        config
    }
}
