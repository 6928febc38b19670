use anyhow::{Context, Result};
use deploy_import::ImportConfig;
use std::path::Path;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub target_folder: Option<String>,
    pub target_owner: Option<String>,
}

/// Read an [`ImportConfig`] from a TOML file. Missing keys keep their
/// defaults.
///
/// ```toml
/// target_folder = "Imported/2024"
/// sacrifice_priority = ["viewsheet", "worksheet"]
/// max_rename_suffix = 50
/// ```
pub(crate) fn load_config(path: &Path) -> Result<ImportConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

pub(crate) fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<ImportConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ImportConfig::default(),
    };

    if overrides.target_folder.is_some() {
        config.target_folder = overrides.target_folder;
    }
    if overrides.target_owner.is_some() {
        config.target_owner = overrides.target_owner;
    }

    log::debug!("Effective import config: {config:?}");
    Ok(config)
}
