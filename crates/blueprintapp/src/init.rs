//! # Context Initialization
//!
//! Resolves where blueprint data lives, loads configuration from there and
//! wires a file-backed [`BlueprintApi`].
//!
//! ## Data Directory Resolution
//!
//! 1. `data_override`, when given (the CLI's `--data`).
//! 2. The `BLUEPRINT_DATA` environment variable, mostly for tests.
//! 3. The OS data directory from the `directories` crate.
//!
//! Configuration is read from `blueprint.toml` in the data directory and
//! layered with `BLUEPRINT__*` environment variables by clapfig. A missing file
//! falls back to the compiled defaults. A malformed file, or names in it that
//! do not resolve to a content kind or category, fail initialization.

use crate::api::BlueprintApi;
use crate::config::BlueprintConfig;
use crate::error::{BlueprintError, ConfigurationError, Result};
use crate::store::fs::FileStore;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_DIR_ENV: &str = "BLUEPRINT_DATA";
pub const CONFIG_FILE_NAME: &str = "blueprint.toml";

pub struct BlueprintContext {
    pub api: BlueprintApi<FileStore>,
    pub data_dir: PathBuf,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "blueprint", "blueprint")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            BlueprintError::Store("could not determine a data directory; pass --data".to_string())
        })
}

/// Loads `blueprint.toml` from `data_dir`.
///
/// Only a missing file falls back to the compiled defaults. A file that is
/// present but malformed is a [`ConfigurationError::InvalidFile`].
pub fn load_config(data_dir: &Path) -> Result<BlueprintConfig> {
    let loaded = Clapfig::builder()
        .app_name("blueprint")
        .file_name(CONFIG_FILE_NAME)
        .search_paths(vec![SearchPath::Path(data_dir.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load();
    match loaded {
        Ok(config) => Ok(config),
        Err(_) if !data_dir.join(CONFIG_FILE_NAME).exists() => Ok(BlueprintConfig::default()),
        Err(e) => Err(ConfigurationError::InvalidFile(e.to_string()).into()),
    }
}

pub fn initialize(data_override: Option<PathBuf>) -> Result<BlueprintContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = load_config(&data_dir)?;
    debug!(data_dir = %data_dir.display(), "initializing blueprint store");

    let store = FileStore::new(data_dir.clone());
    let api = BlueprintApi::new(store, config)?;
    Ok(BlueprintContext { api, data_dir })
}
