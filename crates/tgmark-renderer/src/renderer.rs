//! Node handlers producing Telegram MarkdownV2.
//!
//! Every handler is a pure function of a node and the [`Renderer`]
//! context. Block containers are rendered by [`Renderer::flow`], inline
//! content by [`Renderer::phrasing`].

use std::sync::LazyLock;

use pulldown_cmark::Alignment;
use regex::Regex;

use crate::ast::{Definitions, Node};
use crate::converter::{ConvertOptions, TableMode};
use crate::escape::{
    EscapeContext, encode_url, escape, escape_opt, is_safe_code_language, is_url, wrap,
};
use crate::policy::apply_policy;
use crate::table::{table_to_list, table_to_markdown};

/// Placeholder separating blocks that would otherwise merge when read back.
pub(crate) const EMPTY_COMMENT: &str = "<!---->";

/// Language declared inside a fence body by old editors (`#!javascript`).
static LEGACY_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#![a-z]+\n").unwrap());

static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\d+)\.").unwrap());

/// Bullet used in place of the markdown `*` marker.
const BULLET: &str = "•";

/// Width list item content is indented to.
const LIST_INDENT: usize = 4;

/// Rendering context for one conversion.
///
/// Holds the document's definitions and the conversion options; it is
/// passed down the recursion unchanged.
pub struct Renderer<'a> {
    definitions: &'a Definitions,
    options: ConvertOptions,
}

impl<'a> Renderer<'a> {
    #[must_use]
    pub fn new(definitions: &'a Definitions, options: ConvertOptions) -> Self {
        Self {
            definitions,
            options,
        }
    }

    /// Render top-level nodes of a document.
    #[must_use]
    pub fn render(&self, nodes: &[Node]) -> String {
        self.flow(nodes, false)
    }

    /// Render block content.
    ///
    /// Runs of inline nodes are rendered as one block. Blocks are separated
    /// by a blank line, or by a single newline when `tight`.
    pub(crate) fn flow(&self, nodes: &[Node], tight: bool) -> String {
        let mut out = String::new();
        let mut previous: Option<&Node> = None;
        let mut index = 0;

        while index < nodes.len() {
            let (rendered, current) = if nodes[index].is_phrasing() {
                let run = nodes[index..]
                    .iter()
                    .take_while(|node| node.is_phrasing())
                    .count();
                let rendered = self.phrasing(&nodes[index..index + run]);
                index += run;
                (rendered, None)
            } else {
                let node = &nodes[index];
                index += 1;
                (self.block(node), Some(node))
            };

            if rendered.is_empty() {
                continue;
            }
            if !out.is_empty() {
                let separator = if tight { "\n" } else { "\n\n" };
                out.push_str(separator);
                if needs_placeholder(previous, current) {
                    out.push_str(EMPTY_COMMENT);
                    out.push_str(separator);
                }
            }
            out.push_str(&rendered);
            previous = current;
        }

        out
    }

    /// Render inline content.
    pub(crate) fn phrasing(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            let rendered = self.inline(node);
            if out.ends_with('_') && !out.ends_with("\\_") && rendered.starts_with('_') {
                out.push('\r');
            }
            out.push_str(&rendered);
        }
        out
    }

    fn block(&self, node: &Node) -> String {
        match node {
            Node::Paragraph(children) => self.phrasing(children),
            Node::Heading { children, .. } => self.heading(children),
            Node::List {
                ordered,
                start,
                spread,
                children,
            } => self.list(*ordered, *start, *spread, children),
            Node::Code { lang, value } => code(lang.as_deref(), value),
            Node::Blockquote(children) => self.blockquote(children),
            Node::Html(value) => self.unsupported(value),
            Node::ThematicBreak => self.unsupported("---"),
            Node::Table { align, children } => self.table(align, children),
            Node::ListItem { children, .. }
            | Node::TableRow(children)
            | Node::TableCell(children) => self.flow(children, false),
            inline => self.inline(inline),
        }
    }

    fn inline(&self, node: &Node) -> String {
        match node {
            Node::Text(value) => escape(value, EscapeContext::Default),
            Node::Strong(children) => wrap(&self.phrasing(children), '*'),
            Node::Emphasis(children) => wrap(&self.phrasing(children), '_'),
            Node::Delete(children) => wrap(&self.phrasing(children), '~'),
            Node::InlineCode(value) => inline_code(value),
            Node::Break => "\n".to_owned(),
            Node::InlineHtml(value) => self.unsupported(value),
            Node::Link {
                url,
                title,
                children,
            } => self.link(url, title.as_deref(), children),
            Node::LinkReference {
                identifier,
                children,
            } => self.link_reference(identifier, children),
            Node::Image { url, title, alt } => image(url, title.as_deref(), alt),
            Node::ImageReference { identifier, alt } => self.image_reference(identifier, alt),
            block => self.block(block),
        }
    }

    fn heading(&self, children: &[Node]) -> String {
        wrap(&self.phrasing(children), '*')
    }

    fn list(&self, ordered: bool, start: u64, spread: bool, items: &[Node]) -> String {
        let rendered = items
            .iter()
            .zip(start..)
            .map(|(item, number)| {
                let marker = if ordered {
                    format!("{number}.")
                } else {
                    "*".to_owned()
                };
                let item = self.list_item(item, &marker);
                if ordered {
                    item
                } else {
                    item.replacen('*', BULLET, 1)
                }
            })
            .collect::<Vec<_>>()
            .join(if spread { "\n\n" } else { "\n" });

        if ordered {
            ORDERED_MARKER.replace_all(&rendered, r"${1}\.").into_owned()
        } else {
            rendered
        }
    }

    fn list_item(&self, item: &Node, marker: &str) -> String {
        let (checked, spread, children) = match item {
            Node::ListItem {
                checked,
                spread,
                children,
            } => (*checked, *spread, children.as_slice()),
            other => (None, false, std::slice::from_ref(other)),
        };

        let mut content = match checked {
            Some(true) => r"\[x\] ".to_owned(),
            Some(false) => r"\[ \] ".to_owned(),
            None => String::new(),
        };
        content.push_str(&self.flow(children, !spread));

        let width = (marker.len() + 1).div_ceil(LIST_INDENT) * LIST_INDENT;
        let indent = " ".repeat(width);
        let mut out = format!("{marker:<width$}");
        for (index, line) in content.split('\n').enumerate() {
            if index > 0 {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&indent);
                }
            }
            out.push_str(line);
        }
        out.trim_end_matches(' ').to_owned()
    }

    fn blockquote(&self, children: &[Node]) -> String {
        let content = self.flow(children, false);
        let quoted = content
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    ">".to_owned()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        self.unsupported(&quoted)
    }

    fn table(&self, align: &[Alignment], rows: &[Node]) -> String {
        match self.options.table {
            TableMode::List => table_to_list(self, rows),
            TableMode::Unsupported => self.unsupported(&table_to_markdown(self, align, rows)),
        }
    }

    fn unsupported(&self, fragment: &str) -> String {
        apply_policy(fragment, self.options.unsupported_tags)
    }

    fn link(&self, url: &str, title: Option<&str>, children: &[Node]) -> String {
        let mut text = self.phrasing(children);
        if text.is_empty() {
            text = escape_opt(title, EscapeContext::Default);
        }
        let url = encode_url(url);

        if !is_url(&url) {
            return if text.is_empty() {
                escape(&url, EscapeContext::Default)
            } else {
                text
            };
        }
        bracket_link(&text, &url)
    }

    fn link_reference(&self, identifier: &str, children: &[Node]) -> String {
        let definition = self.definitions.get(identifier);
        let mut text = self.phrasing(children);
        if text.is_empty() {
            text = escape_opt(
                definition.and_then(|def| def.title.as_deref()),
                EscapeContext::Default,
            );
        }

        match definition {
            Some(def) if is_url(&def.url) => bracket_link(&text, &def.url),
            _ => text,
        }
    }

    fn image_reference(&self, identifier: &str, alt: &str) -> String {
        let definition = self.definitions.get(identifier);
        let text = if alt.is_empty() {
            definition.and_then(|def| def.title.as_deref())
        } else {
            Some(alt)
        };

        match definition {
            Some(def) if is_url(&def.url) => {
                bracket_link(&escape_opt(text, EscapeContext::Default), &def.url)
            }
            _ => escape_opt(text, EscapeContext::Default),
        }
    }
}

/// Whether a placeholder must separate two adjacent blocks.
///
/// A list followed by an untagged code block or by another list of the same
/// kind would be read back as one construct.
fn needs_placeholder(previous: Option<&Node>, current: Option<&Node>) -> bool {
    match (previous, current) {
        (Some(Node::List { ordered: left, .. }), Some(Node::List { ordered: right, .. })) => {
            left == right
        }
        (Some(Node::List { .. }), Some(Node::Code { lang, .. })) => lang.is_none(),
        _ => false,
    }
}

/// `[text](url)`, using the URL as text when `text` is empty.
fn bracket_link(text: &str, url: &str) -> String {
    let target = escape(url, EscapeContext::Link);
    if text.is_empty() {
        format!("[{}]({target})", escape(url, EscapeContext::Default))
    } else {
        format!("[{text}]({target})")
    }
}

fn code(lang: Option<&str>, value: &str) -> String {
    let content = LEGACY_LANGUAGE.replace(value, "");
    let language = lang.filter(|lang| is_safe_code_language(lang)).unwrap_or("");
    format!(
        "```{language}\n{}\n```",
        escape(&content, EscapeContext::Code)
    )
}

fn inline_code(value: &str) -> String {
    // A code entity cannot contain a backtick or span lines.
    if value.contains(['`', '\n', '\r']) {
        return escape(value, EscapeContext::Default);
    }
    format!("`{}`", escape(value, EscapeContext::Code))
}

fn image(url: &str, title: Option<&str>, alt: &str) -> String {
    let text = if alt.is_empty() { title } else { Some(alt) };
    if !is_url(url) {
        let text = escape_opt(text, EscapeContext::Default);
        return if text.is_empty() {
            escape(url, EscapeContext::Default)
        } else {
            text
        };
    }
    bracket_link(&escape_opt(text, EscapeContext::Default), url)
}
