//! `splittext` - split rendered text into animatable units
//!
//! Splits the text of a container into char, word and line units while
//! keeping the result visually identical to the original: grapheme-accurate
//! segmentation, kerning compensation for isolated glyphs, font-size-aware
//! line clustering, and a resize-driven re-split lifecycle with
//! deterministic revert and dispose.
//!
//! Layout is read from a host [`Surface`]; [`MemorySurface`] is a
//! self-contained implementation with a deterministic layout engine.

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Intentional coordinate casts
#![allow(clippy::cast_precision_loss)] // Column counts to layout units
#![allow(clippy::module_name_repetitions)] // Allow SplitOptions in split etc
#![allow(clippy::struct_excessive_bools)] // Options and handle state need flags
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::float_cmp)] // Widths are compared exactly on purpose
#![allow(clippy::suboptimal_flops)] // Standard math notation is clearer than mul_add
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests

pub mod completion;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod lines;
pub mod measure;
pub mod split;
pub mod surface;
pub mod unicode;

mod build;
mod kerning;

// Re-export core types at crate root
pub use completion::{Completion, SplitReturn};
pub use config::{DEFAULT_DEBOUNCE, MaskTier, SplitOptions, SplitType};
pub use error::{Diagnostic, Error, Result};
pub use kerning::DEFAULT_KERNING_BOUND;
pub use lifecycle::{
    ChannelObserver, LifecycleState, ObserverFactory, ResizeEntry, ResizeSubscription,
};
pub use lines::line_tolerance;
pub use measure::{AtomicUnit, InlineAncestor, WordUnit, measure};
pub use split::{SplitResult, SplitText, split};
pub use surface::{MemorySurface, NodeId, Rect, Surface, TextStyle};
