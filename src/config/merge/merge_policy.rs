//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("import.mode", "replace")?
        .set_default("import.id_conflict", "fail")?
        .set_default("import.access_control", "ignore")?
        .set_default("import.dependencies", "ignore")?
        .set_default("import.auto_save_threshold", 0)?
        .set_default("import.strict", false)?
        .set_default("storage.registry_path", ".contentpkg/registry")?
        .set_default("storage.snapshot_path", ".contentpkg/repository.json")?
        .set_default("storage.packages_dir", ".contentpkg/packages")
}
