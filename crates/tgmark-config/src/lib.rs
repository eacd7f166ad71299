//! Configuration management for tgmark.
//!
//! Parses `tgmark.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tgmark_paginate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Paginator};
use tgmark_renderer::{Converter, TableMode, UnsupportedTagsStrategy};

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "tgmark.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Clone, Default)]
pub struct CliSettings {
    /// Override unsupported tags strategy.
    pub unsupported_tags: Option<UnsupportedTagsStrategy>,
    /// Override table mode.
    pub table: Option<TableMode>,
    /// Override page size.
    pub size: Option<usize>,
    /// Override page numbering.
    pub page_numbers: Option<bool>,
}

impl CliSettings {
    /// Check if all override fields are None (no overrides specified).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unsupported_tags.is_none()
            && self.table.is_none()
            && self.size.is_none()
            && self.page_numbers.is_none()
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Conversion configuration.
    pub convert: ConvertConfig,
    /// Pagination configuration.
    pub paginate: PaginateConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Conversion configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// What to do with blockquotes, raw HTML and other unsupported elements.
    pub unsupported_tags: UnsupportedTagsStrategy,
    /// How tables are rendered.
    pub table: TableMode,
    /// Whether GFM tables, strikethrough and task lists are parsed.
    pub gfm: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            unsupported_tags: UnsupportedTagsStrategy::default(),
            table: TableMode::default(),
            gfm: true,
        }
    }
}

/// Pagination configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginateConfig {
    /// Soft page budget in UTF-16 code units.
    pub size: usize,
    /// Whether multi-page output gets page-number banners.
    pub page_numbers: bool,
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            page_numbers: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tgmark.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(strategy) = settings.unsupported_tags {
            self.convert.unsupported_tags = strategy;
        }
        if let Some(table) = settings.table {
            self.convert.table = table;
        }
        if let Some(size) = settings.size {
            self.paginate.size = size;
        }
        if let Some(page_numbers) = settings.page_numbers {
            self.paginate.page_numbers = page_numbers;
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the page size is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.paginate.size) {
            return Err(ConfigError::Validation(format!(
                "paginate.size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.paginate.size
            )));
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    #[must_use]
    pub fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_config_from(&current)
    }

    /// Search for config file in `start` and its parents.
    #[must_use]
    pub fn discover_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Converter configured from the `[convert]` section.
    #[must_use]
    pub fn converter(&self) -> Converter {
        Converter::new()
            .with_unsupported_tags(self.convert.unsupported_tags)
            .with_table_mode(self.convert.table)
            .with_gfm(self.convert.gfm)
    }

    /// Paginator configured from both sections.
    #[must_use]
    pub fn paginator(&self) -> Paginator {
        Paginator::new()
            .with_converter(self.converter())
            .with_size(self.paginate.size)
            .with_page_numbers(self.paginate.page_numbers)
    }
}
