//! `tgmark convert` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tgmark_config::Config;

use super::{ConvertFlags, read_input};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown file to convert (default: read stdin).
    file: Option<PathBuf>,

    #[command(flatten)]
    flags: ConvertFlags,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or I/O fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = Config::load(self.flags.config_path(), Some(&self.flags.cli_settings()))?;
        let markdown = read_input(self.file.as_deref())?;

        tracing::debug!(config = ?config.config_path, bytes = markdown.len(), "Converting input");
        let text = config.converter().convert(&markdown);
        if text.is_empty() && !markdown.trim().is_empty() {
            output.warning("Conversion produced no output");
        }

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")?;
        Ok(())
    }
}
