//! Escaping rules for Telegram MarkdownV2.
//!
//! MarkdownV2 reserves most ASCII punctuation. Which characters need a
//! backslash depends on where the text ends up: plain text, the body of a
//! code entity, or the target of an inline link.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::Regex;

/// Characters that must be escaped in plain text.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Characters percent-encoded in link targets (the `encodeURI` set).
const URI_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").unwrap());

static SAFE_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_+\-]+$").unwrap());

/// Where escaped text is going to be placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EscapeContext {
    /// Regular message text.
    #[default]
    Default,
    /// Inside `pre` and `code` entities.
    Code,
    /// Inside the `(...)` part of an inline link.
    Link,
}

impl EscapeContext {
    fn is_reserved(self, c: char) -> bool {
        match self {
            Self::Default => RESERVED.contains(&c),
            Self::Code => matches!(c, '`' | '\\'),
            Self::Link => matches!(c, '(' | ')' | '\\'),
        }
    }
}

/// Escape reserved characters of `text` for the given context.
///
/// Callers escape a raw value exactly once; escaping already escaped text
/// doubles the backslashes.
///
/// # Examples
///
/// ```
/// use tgmark_renderer::{EscapeContext, escape};
///
/// assert_eq!(escape("2 + 2 = 4", EscapeContext::Default), r"2 \+ 2 \= 4");
/// assert_eq!(escape("a_b", EscapeContext::Code), "a_b");
/// ```
pub fn escape(text: &str, context: EscapeContext) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if context.is_reserved(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape an optional value; `None` escapes to an empty string.
pub fn escape_opt(text: Option<&str>, context: EscapeContext) -> String {
    text.map(|text| escape(text, context)).unwrap_or_default()
}

/// Escape reserved characters that are not already part of an escape
/// sequence.
///
/// Used on fragments assembled from already-rendered children, where `\X`
/// pairs must survive untouched.
pub fn escape_unescaped(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push_str("\\\\"),
            }
        } else {
            if RESERVED.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

/// Wrap `value` in an entity marker.
///
/// Empty content produces no markers at all. An underscore marker next to
/// an underscore in the content is separated by `\r`, which Telegram uses to
/// break the `__` underline ambiguity.
pub fn wrap(value: &str, marker: char) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(value.len() + 4);
    out.push(marker);
    if marker == '_' && value.starts_with('_') {
        out.push('\r');
    }
    out.push_str(value);
    if marker == '_' && value.ends_with('_') && !value.ends_with("\\_") {
        out.push('\r');
    }
    out.push(marker);
    out
}

/// Whether `value` is an absolute URL with an explicit scheme.
///
/// Relative paths (`/docs`, `image.png`) are rejected.
pub fn is_url(value: &str) -> bool {
    URL_SCHEME.is_match(value)
}

/// Whether a fence language tag can be emitted verbatim.
pub(crate) fn is_safe_code_language(language: &str) -> bool {
    SAFE_LANGUAGE.is_match(language)
}

/// Percent-encode a link target unless it is already encoded.
///
/// A URL counts as encoded when decoding it changes it.
pub(crate) fn encode_url(url: &str) -> Cow<'_, str> {
    let already_encoded = percent_decode_str(url)
        .decode_utf8()
        .is_ok_and(|decoded| decoded != url);
    if already_encoded {
        Cow::Borrowed(url)
    } else {
        Cow::from(utf8_percent_encode(url, URI_ENCODE_SET))
    }
}
