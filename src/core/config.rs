//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::context::STORE_FILE;
use crate::host::preview::{DEFAULT_PREVIEW_SIZE, MAX_PREVIEW_SIZE, MIN_PREVIEW_SIZE};
use crate::host::MeshRefinement;

/// DXT configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the context store
    pub data_dir: Option<PathBuf>,

    /// Suggested base directory when setting up a new project
    pub default_root: Option<PathBuf>,

    /// Tessellation quality for mesh exports
    pub mesh_refinement: Option<MeshRefinement>,

    /// Preview image edge length in pixels
    pub preview_size: Option<u32>,

    /// Open the project folder after every export
    pub auto_open: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/dxt/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Environment variables
        if let Ok(dir) = std::env::var("DXT_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(root) = std::env::var("DXT_DEFAULT_ROOT") {
            config.default_root = Some(PathBuf::from(root));
        }

        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dxt")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.default_root.is_some() {
            self.default_root = other.default_root;
        }
        if other.mesh_refinement.is_some() {
            self.mesh_refinement = other.mesh_refinement;
        }
        if other.preview_size.is_some() {
            self.preview_size = other.preview_size;
        }
        if other.auto_open.is_some() {
            self.auto_open = other.auto_open;
        }
    }

    /// Directory the context store lives in
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("", "", "dxt")
                    .map(|dirs| dirs.data_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path of the context store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(STORE_FILE)
    }

    pub fn mesh_refinement(&self) -> MeshRefinement {
        self.mesh_refinement.unwrap_or_default()
    }

    /// Preview edge length, clamped to what the renderer accepts
    ///
    /// The clamp also covers hand-edited config files that bypass the
    /// validation in `dxt config set`.
    pub fn preview_size(&self) -> u32 {
        self.preview_size
            .unwrap_or(DEFAULT_PREVIEW_SIZE)
            .clamp(MIN_PREVIEW_SIZE, MAX_PREVIEW_SIZE)
    }

    pub fn auto_open(&self) -> bool {
        self.auto_open.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_size_defaults_when_unset() {
        assert_eq!(Config::default().preview_size(), DEFAULT_PREVIEW_SIZE);
    }

    #[test]
    fn preview_size_is_clamped_to_renderer_bounds() {
        let oversized = Config {
            preview_size: Some(2_000_000_000),
            ..Config::default()
        };
        assert_eq!(oversized.preview_size(), MAX_PREVIEW_SIZE);

        let tiny = Config {
            preview_size: Some(1),
            ..Config::default()
        };
        assert_eq!(tiny.preview_size(), MIN_PREVIEW_SIZE);
    }
}
