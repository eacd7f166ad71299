//! Option parsing errors.

/// Status code carried by option errors.
///
/// An unknown option value is a caller bug rather than a transient
/// condition, so it maps to an internal-error status.
pub const INVALID_OPTION_STATUS: u16 = 500;

/// Error returned when an option value is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("Invalid unsupported tags strategy: '{0}' (expected escape, remove or keep)")]
    UnsupportedTagsStrategy(String),

    #[error("Invalid table mode: '{0}' (expected list or unsupported)")]
    TableMode(String),
}

impl OptionError {
    /// Status code describing this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        INVALID_OPTION_STATUS
    }
}
