//! Application service — configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{EfsmlConfig, StackOverrides, StackProps, apply_config_value};

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<EfsmlConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &EfsmlConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist a single `key = value` setting.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the store fails.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<EfsmlConfig> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::info!(%key, "configuration updated");
    Ok(config)
}

/// Resolve stack props from overrides layered over the stored configuration.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the resolved
/// names are invalid.
pub fn resolve_props(store: &impl ConfigStore, overrides: &StackOverrides) -> Result<StackProps> {
    let config = store.load()?;
    let props = config.resolve(overrides)?;
    tracing::debug!(
        prefix = props.prefix(),
        stage = props.stage(),
        install_packages = props.install_packages().unwrap_or("<default>"),
        "stack props resolved"
    );
    Ok(props)
}
