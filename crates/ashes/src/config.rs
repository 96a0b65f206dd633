//! Renderer configuration
//!
//! Configuration for backend selection and per-backend behavior, loadable
//! from TOML files. Every field has a sensible default so an empty file is
//! a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{AshesError, AshesResult};

/// Which native backend to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Desktop OpenGL (core profile)
    #[default]
    Gl,
    /// Native Vulkan pass-through
    Vulkan,
}

/// OpenGL backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlConfig {
    /// Requested context major version
    pub major_version: u32,
    /// Requested context minor version
    pub minor_version: u32,
    /// Enable `GL_FRAMEBUFFER_SRGB` on the default framebuffer
    pub srgb: bool,
}

impl Default for GlConfig {
    fn default() -> Self {
        Self {
            major_version: 4,
            minor_version: 2,
            srgb: false,
        }
    }
}

/// Vulkan backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VkConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable `VK_LAYER_KHRONOS_validation` when available
    pub validation: bool,
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            app_name: "ashes".to_string(),
            validation: cfg!(debug_assertions),
        }
    }
}

/// Top-level renderer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Backend selection
    pub backend: BackendKind,
    /// Present with vertical sync
    pub vsync: bool,
    /// OpenGL settings
    pub gl: GlConfig,
    /// Vulkan settings
    pub vulkan: VkConfig,
}

impl RendererConfig {
    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AshesResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AshesError::Configuration {
                reason: format!("failed to read config {}: {}", path.as_ref().display(), e),
            }
        })?;
        Self::from_toml(&text)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> AshesResult<Self> {
        toml::from_str(text).map_err(|e| AshesError::Configuration {
            reason: format!("invalid renderer config: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RendererConfig::from_toml("").unwrap();
        assert_eq!(config.backend, BackendKind::Gl);
        assert_eq!(config.gl.major_version, 4);
        assert_eq!(config.vulkan.app_name, "ashes");
    }

    #[test]
    fn backend_and_versions_parse() {
        let config = RendererConfig::from_toml(
            r#"
            backend = "vulkan"
            vsync = true

            [gl]
            major_version = 3
            minor_version = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Vulkan);
        assert!(config.vsync);
        assert_eq!(config.gl.minor_version, 3);
    }

    #[test]
    fn malformed_config_is_a_configuration_error() {
        let err = RendererConfig::from_toml("backend = 12").unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }
}
