//! The split entry point and the handle it returns.
//!
//! A split runs the pipeline strictly in order: measure the original
//! geometry, clear and build the hierarchy, compensate kerning, then cluster
//! and re-wrap lines. Each step reads geometry the next step's mutation
//! would invalidate.
//!
//! # Usage
//!
//! ```
//! use splittext::{MemorySurface, SplitOptions, split};
//!
//! let mut surface = MemorySurface::new(800.0);
//! let heading = surface.mount("<h1>Hello world</h1>");
//!
//! let mut text = split(&mut surface, &heading, SplitOptions::new())?;
//! assert_eq!(text.chars().len(), 10);
//! assert_eq!(text.words().len(), 2);
//! assert_eq!(text.lines().len(), 1);
//!
//! text.revert(&mut surface);
//! # Ok::<(), splittext::Error>(())
//! ```

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::build::build;
use crate::completion::Completion;
use crate::config::{BuildConfig, ResizeCallback, SplitCallback, SplitOptions};
use crate::error::{Diagnostic, Error, Result};
use crate::kerning::compensate;
use crate::lifecycle::{Lifecycle, LifecycleState, ObserverFactory, Pump};
use crate::lines::{cluster, rewrap};
use crate::measure::{WordUnit, measure};
use crate::surface::Surface;

/// The unit collections produced by one pipeline run.
///
/// Tiers that were not requested are empty.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitResult<N> {
    pub chars: Vec<N>,
    pub words: Vec<N>,
    pub lines: Vec<N>,
}

impl<N> Default for SplitResult<N> {
    fn default() -> Self {
        Self {
            chars: Vec::new(),
            words: Vec::new(),
            lines: Vec::new(),
        }
    }
}

impl<N> SplitResult<N> {
    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.words.is_empty() && self.lines.is_empty()
    }
}

/// State captured before the first mutation.
#[derive(Clone, Debug)]
struct Snapshot {
    markup: String,
    aria_label: Option<String>,
}

/// Split the text inside `target`.
///
/// Fails only when `target` is not a live element. Text without visible
/// content yields an inert handle and an [`Diagnostic::EmptyContent`].
pub fn split<S: Surface>(
    surface: &mut S,
    target: &S::Node,
    options: SplitOptions<S::Node>,
) -> Result<SplitText<S::Node>> {
    SplitText::new(surface, target, options)
}

/// Handle to a split: the produced units plus teardown controls.
pub struct SplitText<N> {
    target: N,
    config: BuildConfig,
    result: SplitResult<N>,
    snapshot: Option<Snapshot>,
    lifecycle: Lifecycle,
    auto_split: bool,
    wait_for_fonts: bool,
    observer: Option<Box<dyn ObserverFactory<N>>>,
    on_split: Option<SplitCallback<N>>,
    on_resize: Option<ResizeCallback<N>>,
    revert_on_complete: bool,
    pending: Option<Completion>,
    auto_revert: Option<Completion>,
    diagnostics: Vec<Diagnostic>,
    awaiting_fonts: bool,
    reverted: bool,
}

impl<N: fmt::Debug> fmt::Debug for SplitText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitText")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("result", &self.result)
            .field("lifecycle", &self.lifecycle)
            .field("diagnostics", &self.diagnostics)
            .field("awaiting_fonts", &self.awaiting_fonts)
            .field("reverted", &self.reverted)
            .finish_non_exhaustive()
    }
}

impl<N: Clone + PartialEq + fmt::Debug> SplitText<N> {
    /// Validate `target` and run the first split (or defer it until fonts
    /// are ready, when `wait_for_fonts` is set).
    pub fn new<S>(surface: &mut S, target: &N, options: SplitOptions<N>) -> Result<Self>
    where
        S: Surface<Node = N>,
    {
        if !surface.is_element(target) || !surface.is_connected(target) {
            return Err(Error::InvalidTarget(format!(
                "{target:?} is not a live element"
            )));
        }

        let config = BuildConfig::from(&options);
        let SplitOptions {
            auto_split,
            debounce,
            wait_for_fonts,
            revert_on_complete,
            auto_revert,
            on_split,
            on_resize,
            observer,
            ..
        } = options;

        let mut text = Self {
            target: target.clone(),
            config,
            result: SplitResult::default(),
            snapshot: None,
            lifecycle: Lifecycle::new(debounce),
            auto_split,
            wait_for_fonts,
            observer,
            on_split,
            on_resize,
            revert_on_complete,
            pending: None,
            auto_revert,
            diagnostics: Vec::new(),
            awaiting_fonts: false,
            reverted: false,
        };

        if text.wait_for_fonts && !surface.fonts_ready() {
            debug!("deferring split until fonts are ready");
            text.awaiting_fonts = true;
        } else {
            text.first_split(surface);
        }
        Ok(text)
    }

    /// Char units (empty unless `chars` was requested).
    #[must_use]
    pub fn chars(&self) -> &[N] {
        &self.result.chars
    }

    /// Word units (empty unless `words` was requested).
    #[must_use]
    pub fn words(&self) -> &[N] {
        &self.result.words
    }

    /// Line units (empty unless `lines` was requested).
    #[must_use]
    pub fn lines(&self) -> &[N] {
        &self.result.lines
    }

    /// All three collections.
    #[must_use]
    pub const fn result(&self) -> &SplitResult<N> {
        &self.result
    }

    /// The split container.
    #[must_use]
    pub const fn target(&self) -> &N {
        &self.target
    }

    /// Conditions recovered from so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Autosplit state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Whether the first split is waiting on fonts.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.awaiting_fonts
    }

    /// Whether `revert()` has run.
    #[must_use]
    pub const fn is_reverted(&self) -> bool {
        self.reverted
    }

    /// Continue a split deferred on fonts. Call once the host reports its
    /// fonts are ready; does nothing otherwise.
    pub fn resume<S: Surface<Node = N>>(&mut self, surface: &mut S) {
        if !self.awaiting_fonts || self.state() == LifecycleState::Disposed {
            return;
        }
        if !surface.fonts_ready() {
            return;
        }
        self.awaiting_fonts = false;
        self.first_split(surface);
    }

    /// Drive timers and completions at monotonic instant `now`.
    ///
    /// Drains resize notifications, extends or expires the debounce window,
    /// and reverts when a completion signal has settled.
    pub fn tick<S: Surface<Node = N>>(&mut self, surface: &mut S, now: Duration) {
        if self.reverted {
            return;
        }
        let settled = |c: &Option<Completion>| c.as_ref().is_some_and(Completion::is_settled);
        if settled(&self.pending) || settled(&self.auto_revert) {
            debug!("completion settled, reverting split");
            self.revert(surface);
            return;
        }

        if self.lifecycle.pump(now) == Pump::Due {
            if surface.is_connected(&self.target) {
                self.lifecycle.schedule_resplit();
            } else {
                debug!("target detached before debounce elapsed");
                self.diagnostics.push(Diagnostic::StaleObservation);
                self.lifecycle.abort();
            }
        }
    }

    /// Run a pending re-split. Call on each rendering opportunity.
    pub fn frame<S: Surface<Node = N>>(&mut self, surface: &mut S) {
        if self.state() != LifecycleState::Resplitting {
            return;
        }
        if !surface.is_connected(&self.target) {
            debug!("target detached before re-split");
            self.diagnostics.push(Diagnostic::StaleObservation);
            self.lifecycle.abort();
            return;
        }
        self.resplit(surface);
        self.lifecycle.finish_resplit();
    }

    /// Stop observing and drop pending work. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.awaiting_fonts = false;
        self.pending = None;
        self.auto_revert = None;
        self.lifecycle.dispose();
    }

    /// Restore the markup captured before the first split, then dispose.
    ///
    /// Ligature suppression stays on the target. Safe to call repeatedly.
    pub fn revert<S: Surface<Node = N>>(&mut self, surface: &mut S) {
        if self.reverted {
            return;
        }
        self.reverted = true;
        if let Some(snapshot) = self.snapshot.take() {
            surface.set_inner_markup(&self.target, &snapshot.markup);
            match snapshot.aria_label {
                Some(label) => surface.set_attribute(&self.target, "aria-label", &label),
                None => surface.remove_attribute(&self.target, "aria-label"),
            }
        }
        self.result = SplitResult::default();
        self.dispose();
    }

    fn first_split<S: Surface<Node = N>>(&mut self, surface: &mut S) {
        let words = measure(surface, &self.target);
        if words.is_empty() {
            warn!(node = ?self.target, "no visible text to split");
            self.diagnostics.push(Diagnostic::EmptyContent);
            return;
        }

        self.snapshot = Some(Snapshot {
            markup: surface.inner_markup(&self.target),
            aria_label: surface.attribute(&self.target, "aria-label"),
        });
        if self.snapshot.as_ref().is_some_and(|s| s.aria_label.is_none()) {
            surface.set_attribute(&self.target, "aria-label", &visible_text(&words));
        }
        if self.config.will_change {
            if let Some(smoothing) = surface.computed_style(&self.target).font_smoothing {
                surface.set_style(&self.target, "-webkit-font-smoothing", &smoothing);
            }
        }

        self.run_pipeline(surface, &words);

        if let Some(callback) = self.on_split.as_mut() {
            let completion = callback(&self.result).normalize();
            if self.revert_on_complete {
                self.pending = completion;
            }
        }

        if self.auto_split {
            self.observe(surface);
        }
    }

    fn observe<S: Surface<Node = N>>(&mut self, surface: &S) {
        let ancestor = ancestors(surface, &self.target)
            .into_iter()
            .find(|node| surface.element_rect(node).width > 0.0);
        match (ancestor, self.observer.as_mut()) {
            (Some(ancestor), Some(observer)) => {
                debug!(ancestor = ?ancestor, "observing ancestor for resize");
                let subscription = observer.observe(&ancestor);
                self.lifecycle.start(subscription);
            }
            _ => {
                warn!(node = ?self.target, "autosplit disabled: nothing to observe");
                self.diagnostics.push(Diagnostic::MissingObservationTarget);
            }
        }
    }

    fn resplit<S: Surface<Node = N>>(&mut self, surface: &mut S) {
        let Some(markup) = self.snapshot.as_ref().map(|s| s.markup.clone()) else {
            return;
        };
        surface.set_inner_markup(&self.target, &markup);
        let words = measure(surface, &self.target);
        self.run_pipeline(surface, &words);
        if let Some(callback) = self.on_resize.as_mut() {
            callback(&self.result);
        }
    }

    /// Build, compensate and cluster.
    ///
    /// Holds `&mut self` throughout, and callbacks only run after it returns,
    /// so a second build can never start while one is in progress.
    fn run_pipeline<S: Surface<Node = N>>(&mut self, surface: &mut S, words: &[WordUnit]) {
        debug!(words = words.len(), split_type = ?self.config.split_type, "running split pipeline");

        if self.config.chars() {
            surface.set_style(&self.target, "font-variant-ligatures", "none");
        }

        let mut built = build(surface, &self.target, words, &self.config);
        if self.config.chars() {
            let anomalies = compensate(surface, &mut built, self.config.kerning_bound);
            self.diagnostics.extend(anomalies);
        }

        let lines = if self.config.lines() {
            let font_size = surface.computed_style(&self.target).font_size;
            let groups = cluster(surface, &built, font_size);
            rewrap(surface, &self.target, &built, &groups, &self.config)
        } else {
            Vec::new()
        };

        self.result = SplitResult {
            chars: if self.config.chars() {
                built
                    .iter()
                    .flat_map(|w| w.chars.iter().map(|c| c.node.clone()))
                    .collect()
            } else {
                Vec::new()
            },
            words: if self.config.words() {
                built.iter().map(|w| w.node.clone()).collect()
            } else {
                Vec::new()
            },
            lines,
        };
    }
}

fn ancestors<S: Surface>(surface: &S, node: &S::Node) -> Vec<S::Node> {
    let mut found = Vec::new();
    let mut current = surface.parent_element(node);
    while let Some(parent) = current {
        current = surface.parent_element(&parent);
        found.push(parent);
    }
    found
}

/// Whitespace-collapsed text as it reads on screen.
fn visible_text(words: &[WordUnit]) -> String {
    let mut text = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 && (word.line_breaks_before > 0 || !word.no_space_before) {
            text.push(' ');
        }
        text.push_str(&word.text());
    }
    text
}
