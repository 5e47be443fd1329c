//! Config loading facade: the layered sources merged into one `PackConfig`.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::PackConfig;
use config::{ConfigError, Environment, File};
use std::path::Path;
use tracing::debug;

/// Loads configuration from the layered sources.
///
/// Precedence (lowest first): defaults, global file, workspace files,
/// `CONTENTPKG__SECTION__KEY` environment variables.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(workspace_root: &Path) -> Result<PackConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder.add_source(environment()).build()?;
        debug!(workspace_root = %workspace_root.display(), "Configuration loaded");
        config.try_deserialize()
    }

    /// Load a single file on top of the defaults, skipping the global and
    /// workspace layers.
    pub fn load_from_file(path: &Path) -> Result<PackConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    pub fn default() -> PackConfig {
        PackConfig::default()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CONTENTPKG").separator("__")
}
