//! Configuration for Interject registries.
//!
//! Provides the [`RegistryConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `INTERJECT_CONFIG` environment variable
//! 3. XDG default: `~/.config/interject/config.toml`
//! 4. Built-in defaults

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "INTERJECT_CONFIG";

/// Prefix for environment overrides (`INTERJECT_RESOLUTION_MAX_DEPTH`, ...).
pub const ENV_PREFIX: &str = "INTERJECT";

/// Default recursive resolution limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for a service registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry name, used in log lines.
    pub name: String,

    /// Interception settings.
    pub aop: AopConfig,

    /// Resolution settings.
    pub resolution: ResolutionConfig,
}

/// Interception configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AopConfig {
    /// New registrations the catalog can wrap start with interception
    /// enabled.
    pub enabled_by_default: bool,
}

/// Resolution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Maximum depth of recursive constructor resolution.
    pub max_depth: usize,

    /// Log every resolution step at trace level.
    pub trace: bool,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "interject".to_string(),
            aop: AopConfig::default(),
            resolution: ResolutionConfig::default(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trace: false,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl RegistryConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `INTERJECT_CONFIG` env var
    /// 3. XDG default: `~/.config/interject/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("aop");
        env_opts.add_section("resolution");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("interject").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Builder-style override of the depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.resolution.max_depth = max_depth;
        self
    }

    /// Builder-style override of the default interception flag.
    pub fn with_aop_by_default(mut self, enabled: bool) -> Self {
        self.aop.enabled_by_default = enabled;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
