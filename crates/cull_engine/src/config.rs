//! Configuration system
//!
//! File-backed settings in TOML or RON, selected by file extension.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Configuration trait for file-backed settings types
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::WorldSettings;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("cull_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_world_settings_toml_round_trip() {
        let path = temp_path("settings.toml");
        let mut settings = WorldSettings::default();
        settings.octree.max_depth = 5;
        settings.enable_3d_culling = false;

        settings.save_to_file(&path).unwrap();
        let loaded = WorldSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.octree.max_depth, 5);
        assert!(!loaded.enable_3d_culling);
        assert_eq!(loaded.world_bounds, settings.world_bounds);
    }

    #[test]
    fn test_world_settings_ron_round_trip() {
        let path = temp_path("settings.ron");
        let settings = WorldSettings::default();

        settings.save_to_file(&path).unwrap();
        let loaded = WorldSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.octree.max_elements_per_node, settings.octree.max_elements_per_node);
        assert!(loaded.enable_3d_culling);
    }

    #[test]
    fn test_unsupported_format_is_refused() {
        let path = temp_path("settings.json");
        let settings = WorldSettings::default();

        assert!(matches!(
            settings.save_to_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
