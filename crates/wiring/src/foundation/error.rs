//! Error type for the fallible edges of the crate
//!
//! Wiring itself never fails: unmatched associations and ambiguous unmap
//! calls are logged and skipped. What *can* fail is turning external input
//! into an [`EngineConfig`](crate::config::EngineConfig).

/// Errors raised while building engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// The JSON document could not be parsed into an `EngineConfig`.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// A string did not name any variant of a configuration enum.
    #[error("unknown {kind} `{value}` (expected one of: {expected})")]
    UnknownVariant {
        /// Which setting was being parsed (e.g. "disposal policy").
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Comma-separated accepted spellings.
        expected: &'static str,
    },
}

impl WiringError {
    /// Convenience constructor for [`WiringError::UnknownVariant`].
    pub fn unknown_variant(
        kind: &'static str,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
            expected,
        }
    }
}

/// Result alias for fallible configuration helpers.
pub type WiringResult<T> = Result<T, WiringError>;
