//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod paginate;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use tgmark_config::CliSettings;
use tgmark_renderer::{TableMode, UnsupportedTagsStrategy};

pub(crate) use convert::ConvertArgs;
pub(crate) use paginate::PaginateArgs;

/// Conversion flags shared by all commands.
#[derive(Args)]
pub(crate) struct ConvertFlags {
    /// Path to configuration file (default: auto-discover tgmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Handling of blockquotes, raw HTML and thematic breaks: escape, remove or keep
    /// (overrides config).
    #[arg(short, long, env = "TGMARK_UNSUPPORTED_TAGS")]
    unsupported_tags: Option<UnsupportedTagsStrategy>,

    /// Table rendering: list or unsupported (overrides config).
    #[arg(short, long, env = "TGMARK_TABLE")]
    table: Option<TableMode>,
}

impl ConvertFlags {
    pub(crate) fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub(crate) fn cli_settings(&self) -> CliSettings {
        CliSettings {
            unsupported_tags: self.unsupported_tags,
            table: self.table,
            ..CliSettings::default()
        }
    }
}

/// Read the whole input file, or stdin when no file is given.
pub(crate) fn read_input(file: Option<&Path>) -> std::io::Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path);
    }
    let mut input = String::new();
    std::io::stdin().lock().read_to_string(&mut input)?;
    Ok(input)
}
