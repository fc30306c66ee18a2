use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::record::RecordClass;

use super::cli::CliConfig;
use super::constants::{CONFIG_FILE_NAME, DEFAULT_MAX_SCAN_ROWS};

/// Database configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// DuckDB database file; in-memory when unset
    pub path: Option<PathBuf>,
}

/// Filter configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterFileConfig {
    /// Rows scanned by one post-filtered query before truncating (0 = unbounded)
    pub max_scan_rows: Option<usize>,
    /// Result limit applied to CLI queries whose filter has none
    pub default_limit: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<DatabaseFileConfig>,
    pub filter: Option<FilterFileConfig>,
    pub classes: Option<Vec<RecordClass>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
        }

        if let Some(filter) = other.filter {
            let current = self.filter.get_or_insert_with(FilterFileConfig::default);
            if filter.max_scan_rows.is_some() {
                tracing::trace!(max_scan_rows = ?filter.max_scan_rows, "Merging filter.max_scan_rows");
                current.max_scan_rows = filter.max_scan_rows;
            }
            if filter.default_limit.is_some() {
                tracing::trace!(default_limit = ?filter.default_limit, "Merging filter.default_limit");
                current.default_limit = filter.default_limit;
            }
        }

        // Classes merge by name
        if let Some(classes) = other.classes {
            let current = self.classes.get_or_insert_with(Vec::new);
            for class in classes {
                match current.iter_mut().find(|c| c.name == class.name) {
                    Some(existing) => *existing = class,
                    None => current.push(class),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// `None` = unbounded
    pub max_scan_rows: Option<usize>,
    pub default_limit: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_scan_rows: Some(DEFAULT_MAX_SCAN_ROWS),
            default_limit: None,
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub filter: FilterConfig,
    pub classes: Vec<RecordClass>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();

        let path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                local.exists().then_some(local)
            }
        };

        if let Some(path) = &path {
            let overlay_config = FileConfig::load_from_file(path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
        }
        tracing::debug!(config = ?path, "Config file loaded");

        let file_database = file_config.database.unwrap_or_default();
        let file_filter = file_config.filter.unwrap_or_default();

        // Layer configs: defaults -> file config -> CLI/env overrides
        let max_scan_rows = cli
            .max_scan_rows
            .or(file_filter.max_scan_rows)
            .unwrap_or(DEFAULT_MAX_SCAN_ROWS);

        let config = Self {
            database: DatabaseConfig {
                path: cli.database.clone().or(file_database.path),
            },
            filter: FilterConfig {
                max_scan_rows: (max_scan_rows > 0).then_some(max_scan_rows),
                default_limit: file_filter.default_limit,
            },
            classes: file_config.classes.unwrap_or_default(),
        };
        config.validate()?;

        tracing::debug!(
            database = ?config.database.path,
            max_scan_rows = ?config.filter.max_scan_rows,
            classes = config.classes.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.filter.default_limit == Some(0) {
            anyhow::bail!("Configuration error: filter.default_limit must be greater than 0");
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for class in &self.classes {
            if !seen.insert(class.table.as_str()) {
                anyhow::bail!(
                    "Configuration error: table '{}' is used by more than one class",
                    class.table
                );
            }
        }
        Ok(())
    }
}
