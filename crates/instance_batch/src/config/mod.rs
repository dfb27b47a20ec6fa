//! Configuration system
//!
//! Batching configuration is plain serde data so it can live next to the
//! rest of an application's settings in TOML or RON files.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
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

    /// Values that parse but cannot drive a batch
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default number of instance slots
pub const DEFAULT_MAX_INSTANCES: usize = 256;

/// Byte length of the per-instance record written by the batch manager
pub const DEFAULT_BASE_RECORD_BYTES: usize = 112;

/// Mesh name that is never batched
pub const DEFAULT_EXCLUDED_MESH_NAME: &str = "NavMesh";

/// # Shader Configuration
///
/// Shader sources handed to the batch manager when it builds its
/// pipeline. The batching layer never reads them itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader
    pub vertex_shader_path: String,
    /// Path to the fragment shader
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::new("shaders/unlit_batch.vert", "shaders/unlit_batch.frag")
    }
}

/// # Batch Configuration
///
/// Construction-time settings shared by the instance buffer, the batch
/// manager and the sync controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of instance slots in the buffer
    pub max_instances: usize,
    /// Meshes with this exact name are skipped during traversal
    pub excluded_mesh_name: String,
    /// Bytes per instance in the batch manager's base record
    pub base_record_bytes: usize,
    /// Shader sources for the batched pipeline
    pub shaders: ShaderConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_instances: DEFAULT_MAX_INSTANCES,
            excluded_mesh_name: DEFAULT_EXCLUDED_MESH_NAME.to_string(),
            base_record_bytes: DEFAULT_BASE_RECORD_BYTES,
            shaders: ShaderConfig::default(),
        }
    }
}

impl Config for BatchConfig {}

impl BatchConfig {
    /// Config with a custom slot count and defaults elsewhere
    pub fn with_max_instances(max_instances: usize) -> Self {
        Self {
            max_instances,
            ..Self::default()
        }
    }

    /// Check values that would produce an unusable buffer layout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_instances == 0 {
            return Err(ConfigError::Invalid("max_instances must be positive".to_string()));
        }
        if self.base_record_bytes % 4 != 0 {
            return Err(ConfigError::Invalid(format!(
                "base_record_bytes must be a multiple of 4, got {}",
                self.base_record_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_batch_config() {
        let config = BatchConfig::default();
        assert_eq!(config.max_instances, 256);
        assert_eq!(config.excluded_mesh_name, "NavMesh");
        assert_eq!(config.base_record_bytes, 112);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = BatchConfig::with_max_instances(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unaligned_record() {
        let config = BatchConfig {
            base_record_bytes: 110,
            ..BatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: BatchConfig = toml::from_str("max_instances = 64").unwrap();
        assert_eq!(config.max_instances, 64);
        assert_eq!(config.excluded_mesh_name, "NavMesh");
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join("instance_batch_config_test.ron");
        let path = path.to_str().unwrap();
        let config = BatchConfig::with_max_instances(32);
        config.save_to_file(path).unwrap();
        let loaded = BatchConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = BatchConfig::default().save_to_file("batch.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
