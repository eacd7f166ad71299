//! tgmark CLI - Markdown to Telegram MarkdownV2 converter.
//!
//! Provides commands for:
//! - `convert`: Convert a markdown document to one MarkdownV2 message
//! - `paginate`: Split a long document into MarkdownV2 messages

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, PaginateArgs};
use output::Output;

/// tgmark - Markdown to Telegram MarkdownV2 converter.
#[derive(Parser)]
#[command(name = "tgmark", version, about)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markdown to a single MarkdownV2 message.
    Convert(ConvertArgs),
    /// Split markdown into MarkdownV2 messages that fit Telegram limits.
    Paginate(PaginateArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(&output),
        Commands::Paginate(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
