//! Error and diagnostic types for splittext.

use thiserror::Error;

/// Result type alias for splittext operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures surfaced to the caller.
///
/// Only an unusable target aborts a split. Everything else degrades into a
/// [`Diagnostic`] recorded on the handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The target reference is not a live element in the render tree.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    /// A split-type string named no tier or an unknown tier.
    #[error("invalid split type: {0:?}")]
    InvalidSplitType(String),
}

/// Conditions recovered locally during a split or its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The target had no measurable text; the handle is inert.
    EmptyContent,
    /// Autosplit was requested but no sizeable ancestor exists to observe.
    MissingObservationTarget,
    /// A debounce window elapsed after the target was detached.
    StaleObservation,
    /// A kerning delta fell outside the sanity bound and was not applied.
    MeasurementAnomaly {
        /// Word index within the split.
        word: usize,
        /// Character index within the word.
        index: usize,
        /// The rejected delta.
        delta: f32,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "no visible text to split"),
            Self::MissingObservationTarget => {
                write!(f, "autosplit disabled: no sizeable ancestor to observe")
            }
            Self::StaleObservation => write!(f, "resize ignored: target detached"),
            Self::MeasurementAnomaly { word, index, delta } => write!(
                f,
                "kerning delta {delta:.2} for char {index} of word {word} out of bounds"
            ),
        }
    }
}
