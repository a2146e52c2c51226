//! Split configuration: tier selection, class tags and feature flags.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bitflags::bitflags;

use crate::completion::{Completion, SplitReturn};
use crate::error::Error;
use crate::kerning::DEFAULT_KERNING_BOUND;
use crate::lifecycle::ObserverFactory;
use crate::split::SplitResult;

/// Default debounce window for resize-driven re-splits.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

bitflags! {
    /// Which unit tiers a split materializes.
    ///
    /// Any non-empty combination is valid. Word grouping is always built
    /// internally; `WORDS` only controls whether it is exposed.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct SplitType: u8 {
        /// One unit per grapheme cluster.
        const CHARS = 0x01;
        /// One unit per word.
        const WORDS = 0x02;
        /// One unit per rendered line.
        const LINES = 0x04;
    }
}

impl Default for SplitType {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for SplitType {
    type Err = Error;

    /// Parse `"chars"`, `"words, lines"`, `"chars words"` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tiers = Self::empty();
        for token in s.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
            tiers |= match token.to_ascii_lowercase().as_str() {
                "chars" => Self::CHARS,
                "words" => Self::WORDS,
                "lines" => Self::LINES,
                _ => return Err(Error::InvalidSplitType(s.to_string())),
            };
        }
        if tiers.is_empty() {
            return Err(Error::InvalidSplitType(s.to_string()));
        }
        Ok(tiers)
    }
}

/// Tier whose units get an extra clipping wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskTier {
    Lines,
    Words,
    Chars,
}

/// Callback run after the first split. Its return value may hold a
/// completion that triggers `revert()` when `revert_on_complete` is set.
pub type SplitCallback<N> = Box<dyn FnMut(&SplitResult<N>) -> SplitReturn>;

/// Callback run after every resize-driven re-split.
pub type ResizeCallback<N> = Box<dyn FnMut(&SplitResult<N>)>;

/// Options for a split.
pub struct SplitOptions<N> {
    pub split_type: SplitType,
    pub char_class: String,
    pub word_class: String,
    pub line_class: String,
    pub mask: Option<MaskTier>,
    pub mask_class: String,
    /// Re-split when the observed ancestor changes width.
    pub auto_split: bool,
    pub debounce: Duration,
    /// Attach `--char-index`/`--word-index`/`--line-index` custom properties.
    pub prop_index: bool,
    /// Mark units with `will-change` for compositor promotion.
    pub will_change: bool,
    /// Defer the first measurement until the surface reports fonts ready.
    pub wait_for_fonts: bool,
    /// Kerning deltas at or above this magnitude are not applied.
    pub kerning_bound: f32,
    pub revert_on_complete: bool,
    /// Settling this signal reverts the split.
    pub auto_revert: Option<Completion>,
    pub on_split: Option<SplitCallback<N>>,
    pub on_resize: Option<ResizeCallback<N>>,
    /// Source of resize subscriptions for autosplit.
    pub observer: Option<Box<dyn ObserverFactory<N>>>,
}

impl<N> Default for SplitOptions<N> {
    fn default() -> Self {
        Self {
            split_type: SplitType::default(),
            char_class: "split-char".to_string(),
            word_class: "split-word".to_string(),
            line_class: "split-line".to_string(),
            mask: None,
            mask_class: "split-mask".to_string(),
            auto_split: false,
            debounce: DEFAULT_DEBOUNCE,
            prop_index: false,
            will_change: false,
            wait_for_fonts: true,
            kerning_bound: DEFAULT_KERNING_BOUND,
            revert_on_complete: false,
            auto_revert: None,
            on_split: None,
            on_resize: None,
            observer: None,
        }
    }
}

impl<N> fmt::Debug for SplitOptions<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitOptions")
            .field("split_type", &self.split_type)
            .field("char_class", &self.char_class)
            .field("word_class", &self.word_class)
            .field("line_class", &self.line_class)
            .field("mask", &self.mask)
            .field("auto_split", &self.auto_split)
            .field("debounce", &self.debounce)
            .field("prop_index", &self.prop_index)
            .field("will_change", &self.will_change)
            .field("wait_for_fonts", &self.wait_for_fonts)
            .field("kerning_bound", &self.kerning_bound)
            .field("revert_on_complete", &self.revert_on_complete)
            .field("has_on_split", &self.on_split.is_some())
            .field("has_on_resize", &self.on_resize.is_some())
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<N> SplitOptions<N> {
    /// Options with every tier and default classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the tiers to materialize.
    #[must_use]
    pub fn split_type(mut self, split_type: SplitType) -> Self {
        self.split_type = split_type;
        self
    }

    /// Override the class tag of char units.
    #[must_use]
    pub fn char_class(mut self, class: impl Into<String>) -> Self {
        self.char_class = class.into();
        self
    }

    /// Override the class tag of word units.
    #[must_use]
    pub fn word_class(mut self, class: impl Into<String>) -> Self {
        self.word_class = class.into();
        self
    }

    /// Override the class tag of line units.
    #[must_use]
    pub fn line_class(mut self, class: impl Into<String>) -> Self {
        self.line_class = class.into();
        self
    }

    /// Wrap units of `tier` in clipping masks.
    #[must_use]
    pub fn mask(mut self, tier: MaskTier) -> Self {
        self.mask = Some(tier);
        self
    }

    /// Enable resize-driven re-splitting through `observer`.
    #[must_use]
    pub fn auto_split(mut self, observer: impl ObserverFactory<N> + 'static) -> Self {
        self.auto_split = true;
        self.observer = Some(Box::new(observer));
        self
    }

    /// Override the debounce window.
    #[must_use]
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Expose per-unit ordinals as custom properties.
    #[must_use]
    pub fn prop_index(mut self, enabled: bool) -> Self {
        self.prop_index = enabled;
        self
    }

    /// Add `will-change` hints to units.
    #[must_use]
    pub fn will_change(mut self, enabled: bool) -> Self {
        self.will_change = enabled;
        self
    }

    /// Wait (or not) for fonts before the first measurement.
    #[must_use]
    pub fn wait_for_fonts(mut self, enabled: bool) -> Self {
        self.wait_for_fonts = enabled;
        self
    }

    /// Override the kerning sanity bound.
    #[must_use]
    pub fn kerning_bound(mut self, bound: f32) -> Self {
        self.kerning_bound = bound;
        self
    }

    /// Revert once the completion returned by `on_split` settles.
    #[must_use]
    pub fn revert_on_complete(mut self, enabled: bool) -> Self {
        self.revert_on_complete = enabled;
        self
    }

    /// Revert once `signal` settles.
    #[must_use]
    pub fn auto_revert(mut self, signal: Completion) -> Self {
        self.auto_revert = Some(signal);
        self
    }

    /// Run `callback` after the first split.
    #[must_use]
    pub fn on_split<F, R>(mut self, mut callback: F) -> Self
    where
        F: FnMut(&SplitResult<N>) -> R + 'static,
        R: Into<SplitReturn>,
    {
        self.on_split = Some(Box::new(move |result| callback(result).into()));
        self
    }

    /// Run `callback` after each resize-driven re-split.
    #[must_use]
    pub fn on_resize(mut self, callback: impl FnMut(&SplitResult<N>) + 'static) -> Self {
        self.on_resize = Some(Box::new(callback));
        self
    }
}

/// The parts of [`SplitOptions`] the pipeline reads on every run.
#[derive(Clone, Debug)]
pub(crate) struct BuildConfig {
    pub split_type: SplitType,
    pub char_class: String,
    pub word_class: String,
    pub line_class: String,
    pub mask: Option<MaskTier>,
    pub mask_class: String,
    pub prop_index: bool,
    pub will_change: bool,
    pub kerning_bound: f32,
}

impl<N> From<&SplitOptions<N>> for BuildConfig {
    fn from(options: &SplitOptions<N>) -> Self {
        Self {
            split_type: options.split_type,
            char_class: options.char_class.clone(),
            word_class: options.word_class.clone(),
            line_class: options.line_class.clone(),
            mask: options.mask,
            mask_class: options.mask_class.clone(),
            prop_index: options.prop_index,
            will_change: options.will_change,
            kerning_bound: options.kerning_bound,
        }
    }
}

impl BuildConfig {
    pub(crate) fn chars(&self) -> bool {
        self.split_type.contains(SplitType::CHARS)
    }

    pub(crate) fn words(&self) -> bool {
        self.split_type.contains(SplitType::WORDS)
    }

    pub(crate) fn lines(&self) -> bool {
        self.split_type.contains(SplitType::LINES)
    }
}
