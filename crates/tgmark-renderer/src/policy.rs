//! Handling of elements Telegram cannot display.
//!
//! Blockquotes, raw HTML, thematic breaks and (optionally) tables are first
//! rendered in their native markdown form, then passed through
//! [`apply_policy`] with the caller's [`UnsupportedTagsStrategy`].

use std::fmt;
use std::str::FromStr;

use crate::error::OptionError;
use crate::escape::escape_unescaped;

/// What to do with a fragment the target dialect cannot represent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum UnsupportedTagsStrategy {
    /// Escape the fragment so it shows up as literal text.
    #[default]
    Escape,
    /// Drop the fragment.
    Remove,
    /// Pass the fragment through unchanged.
    Keep,
}

impl UnsupportedTagsStrategy {
    /// Lowercase name as used in configuration and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Escape => "escape",
            Self::Remove => "remove",
            Self::Keep => "keep",
        }
    }
}

impl fmt::Display for UnsupportedTagsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnsupportedTagsStrategy {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "escape" => Ok(Self::Escape),
            "remove" => Ok(Self::Remove),
            "keep" => Ok(Self::Keep),
            _ => Err(OptionError::UnsupportedTagsStrategy(s.to_owned())),
        }
    }
}

/// Apply `strategy` to a rendered fragment.
#[must_use]
pub fn apply_policy(fragment: &str, strategy: UnsupportedTagsStrategy) -> String {
    match strategy {
        UnsupportedTagsStrategy::Escape => escape_unescaped(fragment),
        UnsupportedTagsStrategy::Remove => String::new(),
        UnsupportedTagsStrategy::Keep => fragment.to_owned(),
    }
}
