//! Engine configuration.
//!
//! Everything the engine needs is passed in explicitly; there is no ambient
//! process state. The CLI loads a TOML file into [`Config`] and validates
//! it before any reconciliation starts — malformed configuration is a
//! pre-flight failure, not something discovered mid-run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub reconcile: ReconcileOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Root directory of the catalog. Explicit, never an env variable.
    pub dir: PathBuf,
}

/// The domain services from this run are grouped under.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DomainRef {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// Reconciliation toggles, one named field per recognized option.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct ReconcileOptions {
    /// Group reconciled services under this domain.
    #[serde(default)]
    pub domain: Option<DomainRef>,
    /// Reconcile channel entities and message→channel back-references.
    #[serde(default)]
    pub parse_channels: bool,
    /// Attach message payload schemas and set message `schemaPath`s.
    #[serde(default = "default_true")]
    pub parse_schemas: bool,
    /// Persist the fully resolved spec rendition instead of the raw bytes.
    #[serde(default)]
    pub persist_normalized_spec: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            domain: None,
            parse_channels: false,
            parse_schemas: true,
            persist_normalized_spec: false,
        }
    }
}

impl ReconcileOptions {
    /// Pre-flight validation: missing required identifiers abort before any
    /// reconciliation work happens.
    pub fn validate(&self) -> Result<()> {
        if let Some(domain) = &self.domain {
            if domain.id.trim().is_empty() {
                anyhow::bail!("reconcile.domain.id must not be empty");
            }
            if domain.name.trim().is_empty() {
                anyhow::bail!("reconcile.domain.name must not be empty");
            }
            if domain.version.trim().is_empty() {
                anyhow::bail!("reconcile.domain.version must not be empty");
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.catalog.dir.as_os_str().is_empty() {
        anyhow::bail!("catalog.dir must not be empty");
    }
    config.reconcile.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ReconcileOptions::default();
        assert!(options.domain.is_none());
        assert!(!options.parse_channels);
        assert!(options.parse_schemas);
        assert!(!options.persist_normalized_spec);
    }

    #[test]
    fn toml_defaults_apply() {
        let config: Config = toml::from_str(
            r#"
            [catalog]
            dir = "./catalog"
            "#,
        )
        .unwrap();
        assert!(config.reconcile.parse_schemas);
        assert!(!config.reconcile.parse_channels);
    }

    #[test]
    fn domain_without_version_is_rejected() {
        let options = ReconcileOptions {
            domain: Some(DomainRef {
                id: "orders".to_string(),
                name: "Orders".to_string(),
                version: "".to_string(),
            }),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
