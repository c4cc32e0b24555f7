//! Application configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `strata.ron` in the working directory, or the file given with `--config`
//! 3. Environment variables prefixed with `STRATA_`
//!
//! Example environment variable: `STRATA_WORLD__WORLD_HEIGHT=256`

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_core::world::WorldConfig;

/// Front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// World seed used when `--seed` is not given
    pub seed: u64,

    pub world: WorldConfig,

    /// Maximum cached chunks
    pub cache_limit: usize,

    /// Built-in parameter preset
    pub preset: String,

    /// RON parameter file; takes precedence over `preset`
    pub params_file: Option<PathBuf>,

    pub preview: PreviewConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world: WorldConfig::default(),
            cache_limit: 256,
            preset: "default".to_string(),
            params_file: None,
            preview: PreviewConfig::default(),
        }
    }
}

/// ASCII preview settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Rows printed
    pub rows: usize,
    /// Rows of sky shown above the highest surface
    pub headroom: i32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            rows: 48,
            headroom: 12,
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// An explicit `path` must exist; the implicit `strata.ron` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("strata")
                .format(FileFormat::Ron)
                .required(false),
        };
        Self::build_with(file)
    }

    fn build_with<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("seed", defaults.seed as i64)?
            .set_default("world.world_height", i64::from(defaults.world.world_height))?
            .set_default("world.chunk_width", i64::from(defaults.world.chunk_width))?
            .set_default("world.block_size", i64::from(defaults.world.block_size))?
            .set_default("cache_limit", defaults.cache_limit as i64)?
            .set_default("preset", defaults.preset.clone())?
            .set_default("preview.rows", defaults.preview.rows as i64)?
            .set_default("preview.headroom", i64::from(defaults.preview.headroom))?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (STRATA_SEED, STRATA_WORLD__CHUNK_WIDTH, etc.)
            .add_source(
                Environment::with_prefix("STRATA")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build().context("Failed to build configuration")?;

        let app: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.world.validate().context("Invalid world section")?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_ron(text: &str) -> Result<AppConfig> {
        AppConfig::build_with(File::from_str(text, FileFormat::Ron))
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.world.world_height, 400);
        assert_eq!(config.world.chunk_width, 64);
        assert_eq!(config.preset, "default");
        assert!(config.params_file.is_none());
    }

    #[test]
    fn test_load_config_with_defaults() {
        let config = AppConfig::load(None).expect("Failed to load config");
        assert_eq!(config.world.block_size, 32);
        assert_eq!(config.preview.rows, 48);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_ron(
            r#"(
                seed: 7,
                preset: "flat",
                world: (world_height: 256),
            )"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.preset, "flat");
        assert_eq!(config.world.world_height, 256);
        // Untouched keys keep their defaults
        assert_eq!(config.world.chunk_width, 64);
        assert_eq!(config.cache_limit, 256);
    }

    #[test]
    fn test_invalid_world_rejected() {
        assert!(from_ron("(world: (world_height: 4))").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(AppConfig::load(Some(Path::new("does/not/exist.ron"))).is_err());
    }
}
