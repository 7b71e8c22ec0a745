//! Configuration Loader
//!
//! Merges built-in defaults, an optional TOML file and environment
//! variables, then validates the result.

use super::error::{ConfigResult, ConfigurationError};
use super::RingCacheConfig;
use ::config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "RING_CACHE";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "RING_CACHE_CONFIG";

/// Configuration file looked for when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config/ring-cache.toml";

/// Loads [`RingCacheConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with file auto-discovery.
    ///
    /// Precedence (highest to lowest):
    /// 1. `RING_CACHE__*` environment variables
    /// 2. File named by `RING_CACHE_CONFIG`, or `config/ring-cache.toml` if present
    /// 3. Default values
    pub fn load() -> ConfigResult<RingCacheConfig> {
        let path = Self::discover_config_file();
        Self::load_with_env_prefix(path.as_deref(), ENV_PREFIX)
    }

    /// Load configuration from a specific file; the file must exist.
    pub fn load_from_file(path: &Path) -> ConfigResult<RingCacheConfig> {
        Self::load_with_env_prefix(Some(path), ENV_PREFIX)
    }

    /// Load configuration with an explicit environment prefix.
    ///
    /// Useful for testing without touching the process-wide `RING_CACHE__*`
    /// namespace.
    pub fn load_with_env_prefix(
        path: Option<&Path>,
        env_prefix: &str,
    ) -> ConfigResult<RingCacheConfig> {
        let defaults = Config::try_from(&RingCacheConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigurationError::config_file_not_found(path));
            }
            debug!(path = %path.display(), "Loading cache configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: RingCacheConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            config_file = ?path,
            replication_factor = config.cluster.replication_factor,
            virtual_nodes_per_node = config.cluster.virtual_nodes_per_node,
            seed_nodes = config.cluster.nodes.len(),
            "Cache configuration loaded"
        );

        Ok(config)
    }

    /// Configuration file to use when none is given explicitly
    fn discover_config_file() -> Option<PathBuf> {
        if let Ok(explicit) = env::var(CONFIG_PATH_VAR) {
            return Some(PathBuf::from(explicit));
        }

        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.is_file().then_some(default_path)
    }
}
