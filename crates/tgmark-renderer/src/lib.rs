//! Markdown to Telegram MarkdownV2 renderer.
//!
//! This crate parses markdown with `pulldown-cmark` and renders it in the
//! restricted MarkdownV2 dialect accepted by the Telegram Bot API.
//!
//! # Architecture
//!
//! - [`Document`]: owned syntax tree plus reference [`Definitions`]
//! - [`Renderer`]: per-node handlers producing MarkdownV2
//! - [`escape()`]: context-dependent escaping of reserved characters
//! - [`apply_policy`]: handling of elements Telegram cannot display
//!   (blockquotes, raw HTML, thematic breaks, tables in
//!   [`TableMode::Unsupported`])
//!
//! Tables are converted to a numbered list of records by default.
//!
//! # Example
//!
//! ```
//! use tgmark_renderer::{ConvertOptions, convert};
//!
//! let text = convert("# Title\n\n* one\n* two", ConvertOptions::default());
//! assert_eq!(text, "*Title*\n\n•   one\n•   two");
//! ```

mod ast;
mod converter;
mod error;
mod escape;
mod policy;
mod renderer;
mod table;

pub use ast::{Definition, Definitions, Document, Node, normalize_identifier, plain_text};
pub use converter::{ConvertOptions, Converter, TableMode, convert};
pub use error::{INVALID_OPTION_STATUS, OptionError};
pub use escape::{EscapeContext, escape, escape_opt, escape_unescaped, is_url, wrap};
pub use policy::{UnsupportedTagsStrategy, apply_policy};
pub use renderer::Renderer;
pub use table::{table_to_list, table_to_markdown};
