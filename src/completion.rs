//! Completion signals returned from split callbacks.
//!
//! An `on_split` callback may hand back nothing, one animation, a group of
//! animations or a deferred value. Those shapes are an explicit
//! [`SplitReturn`] union and [`SplitReturn::normalize`] folds them into at most
//! one [`Completion`] to wait for.

use std::cell::Cell;
use std::rc::Rc;

/// A settle-once signal shared between a producer and the splitter.
///
/// Cloning shares the underlying signal. A completion built from a group is
/// settled once every member is. [`Completion::default`] is unsettled, like
/// [`Completion::new`].
#[derive(Clone, Debug)]
pub struct Completion {
    signals: Vec<Rc<Cell<bool>>>,
}

impl Completion {
    /// Create an unsettled completion.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signals: vec![Rc::new(Cell::new(false))],
        }
    }

    /// Create a completion that is already settled.
    #[must_use]
    pub fn settled() -> Self {
        let completion = Self::new();
        completion.settle();
        completion
    }

    /// Mark the signal (and every member of a group) settled.
    pub fn settle(&self) {
        for signal in &self.signals {
            signal.set(true);
        }
    }

    /// Whether every member has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.signals.iter().all(|s| s.get())
    }

    /// Combine completions; the result settles when all of them have.
    ///
    /// Combining nothing gives a settled completion.
    #[must_use]
    pub fn all(completions: impl IntoIterator<Item = Self>) -> Self {
        Self {
            signals: completions.into_iter().flat_map(|c| c.signals).collect(),
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

/// What an `on_split` callback hands back.
#[derive(Clone, Debug, Default)]
pub enum SplitReturn {
    /// Nothing to wait for.
    #[default]
    None,
    /// A single animation.
    Animation(Completion),
    /// Several animations running together.
    Group(Vec<Completion>),
    /// A deferred value that settles later.
    Deferred(Completion),
}

impl SplitReturn {
    /// Reduce to "nothing pending" or "one completion to await".
    ///
    /// An empty group has nothing to wait for.
    #[must_use]
    pub fn normalize(self) -> Option<Completion> {
        match self {
            Self::None => None,
            Self::Animation(c) | Self::Deferred(c) => Some(c),
            Self::Group(group) if group.is_empty() => None,
            Self::Group(group) => Some(Completion::all(group)),
        }
    }
}

impl From<Completion> for SplitReturn {
    fn from(completion: Completion) -> Self {
        Self::Animation(completion)
    }
}

impl From<Vec<Completion>> for SplitReturn {
    fn from(group: Vec<Completion>) -> Self {
        Self::Group(group)
    }
}

impl From<()> for SplitReturn {
    fn from((): ()) -> Self {
        Self::None
    }
}
