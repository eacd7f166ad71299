//! Owned syntax tree built from pulldown-cmark events.
//!
//! The renderer works on a tree rather than on the event stream so that
//! handlers can look at a whole node (a table, a link and its text, a list
//! and all its items) before deciding what to emit.

use std::collections::HashMap;

use pulldown_cmark::{
    Alignment, CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag,
};

/// A markdown syntax node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Paragraph(Vec<Node>),
    Heading {
        level: u8,
        children: Vec<Node>,
    },
    Strong(Vec<Node>),
    Emphasis(Vec<Node>),
    Delete(Vec<Node>),
    List {
        ordered: bool,
        start: u64,
        spread: bool,
        children: Vec<Node>,
    },
    ListItem {
        checked: Option<bool>,
        spread: bool,
        children: Vec<Node>,
    },
    Code {
        lang: Option<String>,
        value: String,
    },
    InlineCode(String),
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    LinkReference {
        identifier: String,
        children: Vec<Node>,
    },
    Image {
        url: String,
        title: Option<String>,
        alt: String,
    },
    ImageReference {
        identifier: String,
        alt: String,
    },
    Text(String),
    Break,
    Blockquote(Vec<Node>),
    /// Block-level raw HTML.
    Html(String),
    /// Raw HTML inside a paragraph.
    InlineHtml(String),
    Table {
        align: Vec<Alignment>,
        children: Vec<Node>,
    },
    TableRow(Vec<Node>),
    TableCell(Vec<Node>),
    ThematicBreak,
}

impl Node {
    /// Whether this node is inline (phrasing) content.
    #[must_use]
    pub fn is_phrasing(&self) -> bool {
        matches!(
            self,
            Self::Strong(_)
                | Self::Emphasis(_)
                | Self::Delete(_)
                | Self::InlineCode(_)
                | Self::Link { .. }
                | Self::LinkReference { .. }
                | Self::Image { .. }
                | Self::ImageReference { .. }
                | Self::Text(_)
                | Self::Break
                | Self::InlineHtml(_)
        )
    }

    /// Child nodes, if this kind of node has any.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Paragraph(children)
            | Self::Strong(children)
            | Self::Emphasis(children)
            | Self::Delete(children)
            | Self::Blockquote(children)
            | Self::TableRow(children)
            | Self::TableCell(children)
            | Self::Heading { children, .. }
            | Self::List { children, .. }
            | Self::ListItem { children, .. }
            | Self::Link { children, .. }
            | Self::LinkReference { children, .. }
            | Self::Table { children, .. } => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Paragraph(children)
            | Self::Strong(children)
            | Self::Emphasis(children)
            | Self::Delete(children)
            | Self::Blockquote(children)
            | Self::TableRow(children)
            | Self::TableCell(children)
            | Self::Heading { children, .. }
            | Self::List { children, .. }
            | Self::ListItem { children, .. }
            | Self::Link { children, .. }
            | Self::LinkReference { children, .. }
            | Self::Table { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Whether this node is an HTML comment.
    fn is_comment(&self) -> bool {
        match self {
            Self::Html(value) | Self::InlineHtml(value) => {
                let value = value.trim();
                value.starts_with("<!--") && value.ends_with("-->")
            }
            _ => false,
        }
    }
}

/// A reference-style link or image definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    /// Label as written in the document.
    pub identifier: String,
    /// Optional title.
    pub title: Option<String>,
    /// Destination URL.
    pub url: String,
}

/// Definitions of a document, keyed by normalized identifier.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    entries: HashMap<String, Definition>,
}

impl Definitions {
    /// Look up a definition by identifier.
    ///
    /// Lookup is case-insensitive and treats whitespace runs as one space.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&Definition> {
        self.entries.get(&normalize_identifier(identifier))
    }

    /// Add a definition. The first definition of an identifier wins.
    pub fn insert(&mut self, definition: Definition) {
        self.entries
            .entry(normalize_identifier(&definition.identifier))
            .or_insert(definition);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collect the reference definitions found by the parser.
    fn from_parser(parser: &Parser<'_>) -> Self {
        let mut definitions = Self::default();
        for (label, def) in parser.reference_definitions().iter() {
            definitions.insert(Definition {
                identifier: label.to_owned(),
                title: def.title.as_ref().map(ToString::to_string),
                url: def.dest.to_string(),
            });
        }
        definitions
    }
}

/// Normalize a reference label: case-folded, whitespace collapsed.
#[must_use]
pub fn normalize_identifier(identifier: &str) -> String {
    identifier
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A parsed document.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Top-level block nodes.
    pub children: Vec<Node>,
    /// Reference definitions, already removed from `children`.
    pub definitions: Definitions,
}

impl Document {
    /// Parse markdown with the given parser options.
    #[must_use]
    pub fn parse(markdown: &str, options: Options) -> Self {
        let parser = Parser::new_ext(markdown, options);
        let definitions = Definitions::from_parser(&parser);
        let children = TreeBuilder::default().build(parser);
        Self {
            children,
            definitions,
        }
    }

    /// Remove HTML comments from the whole tree.
    pub fn strip_comments(&mut self) {
        strip_comments(&mut self.children);
    }
}

/// Remove HTML comment nodes, recursively.
pub fn strip_comments(nodes: &mut Vec<Node>) {
    nodes.retain(|node| !node.is_comment());
    for node in nodes {
        if let Some(children) = node.children_mut() {
            strip_comments(children);
        }
    }
}

/// Kind of an open container while folding events.
enum Frame {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock(Option<String>),
    HtmlBlock,
    List(Option<u64>),
    Item { checked: Option<bool> },
    Table(Vec<Alignment>),
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link {
        reference: Option<String>,
        url: String,
        title: String,
    },
    Image {
        reference: Option<String>,
        url: String,
        title: String,
    },
    /// Containers without a node of their own; children are spliced into
    /// the parent.
    Transparent,
}

struct Open {
    frame: Frame,
    children: Vec<Node>,
}

/// Folds a pulldown-cmark event stream into a [`Node`] tree.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Open>,
}

impl TreeBuilder {
    fn build<'a>(mut self, events: impl Iterator<Item = Event<'a>>) -> Vec<Node> {
        self.stack.push(Open {
            frame: Frame::Root,
            children: Vec::new(),
        });

        for event in events {
            self.process_event(event);
        }

        // Unbalanced input cannot come from the parser, but close whatever is
        // left open so nothing is lost.
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack.pop().map(|open| open.children).unwrap_or_default()
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(text) => self.push(Node::Text(text.into_string())),
            Event::Code(code) => self.push(Node::InlineCode(code.into_string())),
            Event::Html(html) => self.push(Node::Html(html.into_string())),
            Event::InlineHtml(html) => self.push(Node::InlineHtml(html.into_string())),
            Event::SoftBreak => self.push(Node::Text("\n".to_owned())),
            Event::HardBreak => self.push(Node::Break),
            Event::Rule => self.push(Node::ThematicBreak),
            Event::TaskListMarker(checked) => self.set_checked(checked),
            Event::FootnoteReference(label) => self.push(Node::Text(format!("[^{label}]"))),
            Event::InlineMath(math) => self.push(Node::Text(format!("${math}$"))),
            Event::DisplayMath(math) => self.push(Node::Text(format!("$${math}$$"))),
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { level, .. } => Frame::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => Frame::BlockQuote,
            Tag::CodeBlock(kind) => Frame::CodeBlock(match kind {
                CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_owned),
                CodeBlockKind::Indented => None,
            }),
            Tag::HtmlBlock => Frame::HtmlBlock,
            Tag::List(start) => Frame::List(start),
            Tag::Item => Frame::Item { checked: None },
            Tag::Table(alignments) => Frame::Table(alignments),
            Tag::TableHead | Tag::TableRow => Frame::TableRow,
            Tag::TableCell => Frame::TableCell,
            Tag::Emphasis => Frame::Emphasis,
            Tag::Strong => Frame::Strong,
            Tag::Strikethrough => Frame::Strikethrough,
            Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            } => Frame::Link {
                reference: reference_label(link_type, &id),
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            } => Frame::Image {
                reference: reference_label(link_type, &id),
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::FootnoteDefinition(_)
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => Frame::Transparent,
        };
        self.stack.push(Open {
            frame,
            children: Vec::new(),
        });
    }

    fn close(&mut self) {
        let Some(Open { frame, children }) = self.stack.pop() else {
            return;
        };
        let node = match frame {
            Frame::Root => {
                self.stack.push(Open { frame, children });
                return;
            }
            Frame::Transparent => {
                for child in children {
                    self.push(child);
                }
                return;
            }
            Frame::Paragraph => Node::Paragraph(children),
            Frame::Heading(level) => Node::Heading { level, children },
            Frame::BlockQuote => Node::Blockquote(children),
            Frame::CodeBlock(lang) => {
                let mut value = plain_text(&children);
                if value.ends_with('\n') {
                    value.pop();
                }
                Node::Code { lang, value }
            }
            Frame::HtmlBlock => {
                let value = children
                    .iter()
                    .filter_map(|child| match child {
                        Node::Html(value) | Node::Text(value) => Some(value.as_str()),
                        _ => None,
                    })
                    .collect::<String>();
                Node::Html(value.trim_end_matches('\n').to_owned())
            }
            Frame::List(start) => {
                let spread = children
                    .iter()
                    .any(|item| matches!(item, Node::ListItem { spread: true, .. }));
                Node::List {
                    ordered: start.is_some(),
                    start: start.unwrap_or(1),
                    spread,
                    children,
                }
            }
            Frame::Item { checked } => {
                let spread = children
                    .iter()
                    .any(|child| matches!(child, Node::Paragraph(_)));
                Node::ListItem {
                    checked,
                    spread,
                    children,
                }
            }
            Frame::Table(align) => Node::Table { align, children },
            Frame::TableRow => Node::TableRow(children),
            Frame::TableCell => Node::TableCell(children),
            Frame::Emphasis => Node::Emphasis(children),
            Frame::Strong => Node::Strong(children),
            Frame::Strikethrough => Node::Delete(children),
            Frame::Link {
                reference: Some(identifier),
                ..
            } => Node::LinkReference {
                identifier,
                children,
            },
            Frame::Link {
                reference: None,
                url,
                title,
            } => Node::Link {
                url,
                title: non_empty(title),
                children,
            },
            Frame::Image {
                reference: Some(identifier),
                ..
            } => Node::ImageReference {
                identifier,
                alt: plain_text(&children),
            },
            Frame::Image {
                reference: None,
                url,
                title,
            } => Node::Image {
                url,
                title: non_empty(title),
                alt: plain_text(&children),
            },
        };
        self.push(node);
    }

    /// Append a node to the innermost open container, merging adjacent text.
    fn push(&mut self, node: Node) {
        let Some(open) = self.stack.last_mut() else {
            return;
        };
        if let (Some(Node::Text(last)), Node::Text(text)) = (open.children.last_mut(), &node) {
            last.push_str(text);
            return;
        }
        open.children.push(node);
    }

    fn set_checked(&mut self, value: bool) {
        if let Some(Open {
            frame: Frame::Item { checked },
            ..
        }) = self
            .stack
            .iter_mut()
            .rev()
            .find(|open| matches!(open.frame, Frame::Item { .. }))
        {
            *checked = Some(value);
        }
    }
}

/// Reference label for reference-style links, `None` for direct links.
fn reference_label(link_type: LinkType, id: &str) -> Option<String> {
    match link_type {
        LinkType::Reference
        | LinkType::ReferenceUnknown
        | LinkType::Collapsed
        | LinkType::CollapsedUnknown
        | LinkType::Shortcut
        | LinkType::ShortcutUnknown => Some(id.to_owned()),
        _ => None,
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Concatenated literal text of a node list (image alt text, code bodies).
#[must_use]
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(value) | Node::InlineCode(value) => out.push_str(value),
            Node::Break => out.push('\n'),
            Node::Image { alt, .. } | Node::ImageReference { alt, .. } => out.push_str(alt),
            other => collect_text(other.children(), out),
        }
    }
}
