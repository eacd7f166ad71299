//! `tgmark paginate` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tgmark_config::{CliSettings, Config};
use tgmark_paginate::display_len;

use super::{ConvertFlags, read_input};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the paginate command.
#[derive(Args)]
pub(crate) struct PaginateArgs {
    /// Markdown file to paginate (default: read stdin).
    file: Option<PathBuf>,

    #[command(flatten)]
    flags: ConvertFlags,

    /// Soft page budget in UTF-16 code units (overrides config).
    #[arg(short, long)]
    size: Option<usize>,

    /// Do not prefix pages with page numbers.
    #[arg(long)]
    no_page_num: bool,

    /// Line printed between pages.
    #[arg(long, default_value = "---")]
    separator: String,

    /// Print pages as a JSON array of strings.
    #[arg(long, conflicts_with = "separator")]
    json: bool,
}

impl PaginateArgs {
    /// Execute the paginate command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, I/O or JSON serialization fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            size: self.size,
            page_numbers: self.no_page_num.then_some(false),
            ..self.flags.cli_settings()
        };
        let config = Config::load(self.flags.config_path(), Some(&cli_settings))?;
        let markdown = read_input(self.file.as_deref())?;

        let paginator = config.paginator();
        tracing::debug!(
            config = ?config.config_path,
            size = paginator.size(),
            "Paginating input"
        );
        let pages = paginator.paginate(&markdown);
        for (index, page) in pages.iter().enumerate() {
            tracing::debug!(page = index + 1, len = display_len(page), "Page ready");
        }
        output.info(&format!("Split into {} page(s)", pages.len()));

        let rendered = format_pages(&pages, self.json, &self.separator)?;
        writeln!(std::io::stdout().lock(), "{rendered}")?;
        Ok(())
    }
}

/// Join pages for printing, either as a JSON array or separated by a line.
fn format_pages(pages: &[String], json: bool, separator: &str) -> Result<String, CliError> {
    if json {
        return Ok(serde_json::to_string_pretty(pages)?);
    }
    Ok(pages.join(&format!("\n\n{separator}\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: PaginateArgs,
    }

    #[test]
    fn test_format_pages_with_separator() {
        let pages = vec!["one".to_owned(), "two".to_owned()];
        assert_eq!(
            format_pages(&pages, false, "===").unwrap(),
            "one\n\n===\n\ntwo"
        );
    }

    #[test]
    fn test_format_pages_as_json() {
        let pages = vec!["a\\.".to_owned(), "b".to_owned()];
        let rendered = format_pages(&pages, true, "---").unwrap();
        let parsed: Vec<String> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, pages);
    }

    #[test]
    fn test_json_conflicts_with_separator() {
        assert!(TestCli::try_parse_from(["tgmark", "--json", "--separator", "==="]).is_err());
    }

    #[test]
    fn test_args_to_settings() {
        let cli = TestCli::try_parse_from(["tgmark", "notes.md", "-s", "500", "--no-page-num"])
            .unwrap();
        assert_eq!(cli.args.file, Some(PathBuf::from("notes.md")));
        assert_eq!(cli.args.size, Some(500));
        assert!(cli.args.no_page_num);
        assert_eq!(cli.args.separator, "---");
    }
}
