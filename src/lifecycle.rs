//! Resize observation and the autosplit state machine.
//!
//! ```text
//! Idle ──start──▶ Observing ──width change──▶ Debouncing ──deadline──▶ Resplitting
//!                     ▲                          │  ▲ width change        │
//!                     │                          └──┘ (extends window)    │
//!                     └─────────────────────── frame ─────────────────────┘
//!
//! any state ──dispose──▶ Disposed
//! ```
//!
//! The machine is host-driven: [`Lifecycle::pump`] drains pending resize
//! events at a given instant and reports when the debounce window has
//! elapsed. Nothing blocks and nothing runs on its own.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::trace;

/// One size-change notification.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResizeEntry {
    pub width: f32,
    pub height: f32,
}

impl ResizeEntry {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A cancellable stream of resize notifications for one node.
pub trait ResizeSubscription {
    /// Next pending notification, if any.
    fn poll(&mut self) -> Option<ResizeEntry>;

    /// Stop receiving notifications.
    fn disconnect(&mut self);
}

/// Creates resize subscriptions. Injected into the splitter so hosts and
/// tests decide where notifications come from.
pub trait ObserverFactory<N> {
    fn observe(&mut self, target: &N) -> Box<dyn ResizeSubscription>;
}

/// Autosplit state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not observing (not split yet, or autosplit unavailable).
    Idle,
    /// Waiting for width changes.
    Observing,
    /// A width change is pending; re-split once `deadline` passes quietly.
    Debouncing { deadline: Duration },
    /// A re-split is due on the next rendering opportunity.
    Resplitting,
    /// Terminal.
    Disposed,
}

/// What [`Lifecycle::pump`] found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pump {
    Quiet,
    /// The debounce window elapsed.
    Due,
}

pub(crate) struct Lifecycle {
    state: LifecycleState,
    subscription: Option<Box<dyn ResizeSubscription>>,
    debounce: Duration,
    last_width: Option<f32>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state)
            .field("observing", &self.subscription.is_some())
            .field("debounce", &self.debounce)
            .field("last_width", &self.last_width)
            .finish()
    }
}

impl Lifecycle {
    pub(crate) const fn new(debounce: Duration) -> Self {
        Self {
            state: LifecycleState::Idle,
            subscription: None,
            debounce,
            last_width: None,
        }
    }

    pub(crate) const fn state(&self) -> LifecycleState {
        self.state
    }

    fn transition(&mut self, next: LifecycleState) {
        trace!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }

    /// Begin observing. The first notification becomes the width baseline.
    pub(crate) fn start(&mut self, subscription: Box<dyn ResizeSubscription>) {
        if self.state != LifecycleState::Idle {
            return;
        }
        self.subscription = Some(subscription);
        self.last_width = None;
        self.transition(LifecycleState::Observing);
    }

    /// Drain notifications received up to `now` and check the deadline.
    pub(crate) fn pump(&mut self, now: Duration) -> Pump {
        let Some(subscription) = self.subscription.as_mut() else {
            return Pump::Quiet;
        };

        let mut changed = false;
        while let Some(entry) = subscription.poll() {
            match self.last_width {
                None => self.last_width = Some(entry.width),
                Some(width) if width == entry.width => {}
                Some(_) => {
                    self.last_width = Some(entry.width);
                    changed = true;
                }
            }
        }

        match self.state {
            LifecycleState::Observing | LifecycleState::Debouncing { .. } if changed => {
                self.transition(LifecycleState::Debouncing {
                    deadline: now + self.debounce,
                });
                Pump::Quiet
            }
            LifecycleState::Debouncing { deadline } if now >= deadline => Pump::Due,
            _ => Pump::Quiet,
        }
    }

    /// Move a due debounce into the pending re-split state.
    pub(crate) fn schedule_resplit(&mut self) {
        if matches!(self.state, LifecycleState::Debouncing { .. }) {
            self.transition(LifecycleState::Resplitting);
        }
    }

    /// Drop a pending debounce or re-split and keep observing.
    pub(crate) fn abort(&mut self) {
        if matches!(
            self.state,
            LifecycleState::Debouncing { .. } | LifecycleState::Resplitting
        ) {
            self.transition(LifecycleState::Observing);
        }
    }

    /// Finish a re-split and return to observing.
    pub(crate) fn finish_resplit(&mut self) {
        if self.state == LifecycleState::Resplitting {
            self.transition(LifecycleState::Observing);
        }
    }

    /// Disconnect observation and clear any pending work. Idempotent.
    pub(crate) fn dispose(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        if let Some(mut subscription) = self.subscription.take() {
            subscription.disconnect();
        }
        self.transition(LifecycleState::Disposed);
    }
}

struct Watcher<N> {
    node: N,
    tx: Sender<ResizeEntry>,
    connected: Rc<Cell<bool>>,
}

struct Registry<N> {
    watchers: Vec<Watcher<N>>,
    disconnects: Rc<Cell<usize>>,
}

/// An [`ObserverFactory`] backed by channels.
///
/// Keep a clone on the host side and call [`ChannelObserver::notify`] when a
/// node's size changes; every live subscription for that node receives the
/// entry.
pub struct ChannelObserver<N> {
    registry: Rc<RefCell<Registry<N>>>,
}

impl<N> Clone for ChannelObserver<N> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<N> Default for ChannelObserver<N> {
    fn default() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                watchers: Vec::new(),
                disconnects: Rc::new(Cell::new(0)),
            })),
        }
    }
}

impl<N> fmt::Debug for ChannelObserver<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelObserver")
            .field("active", &self.active())
            .field("disconnects", &self.disconnects())
            .finish()
    }
}

impl<N: PartialEq> ChannelObserver<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `entry` to every live subscription on `node`. Returns how many
    /// subscriptions received it.
    pub fn notify(&self, node: &N, entry: ResizeEntry) -> usize {
        let mut registry = self.registry.borrow_mut();
        registry.watchers.retain(|w| w.connected.get());
        registry
            .watchers
            .iter()
            .filter(|w| w.node == *node)
            .filter(|w| w.tx.send(entry).is_ok())
            .count()
    }
}

impl<N> ChannelObserver<N> {
    /// Number of live subscriptions.
    #[must_use]
    pub fn active(&self) -> usize {
        self.registry
            .borrow()
            .watchers
            .iter()
            .filter(|w| w.connected.get())
            .count()
    }

    /// Number of subscriptions torn down so far.
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.registry.borrow().disconnects.get()
    }
}

struct ChannelSubscription {
    rx: Receiver<ResizeEntry>,
    connected: Rc<Cell<bool>>,
    disconnects: Rc<Cell<usize>>,
}

impl ResizeSubscription for ChannelSubscription {
    fn poll(&mut self) -> Option<ResizeEntry> {
        if !self.connected.get() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    fn disconnect(&mut self) {
        if self.connected.replace(false) {
            self.disconnects.set(self.disconnects.get() + 1);
        }
    }
}

impl<N: Clone> ObserverFactory<N> for ChannelObserver<N> {
    fn observe(&mut self, target: &N) -> Box<dyn ResizeSubscription> {
        let (tx, rx) = mpsc::channel();
        let connected = Rc::new(Cell::new(true));
        let mut registry = self.registry.borrow_mut();
        registry.watchers.push(Watcher {
            node: target.clone(),
            tx,
            connected: Rc::clone(&connected),
        });
        Box::new(ChannelSubscription {
            rx,
            connected,
            disconnects: Rc::clone(&registry.disconnects),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn observing() -> (ChannelObserver<u32>, Lifecycle) {
        let mut observer = ChannelObserver::new();
        let mut lifecycle = Lifecycle::new(ms(200));
        lifecycle.start(observer.observe(&1));
        (observer, lifecycle)
    }

    #[test]
    fn test_baseline_is_ignored() {
        let (observer, mut lifecycle) = observing();
        observer.notify(&1, ResizeEntry::new(300.0, 50.0));
        assert_eq!(lifecycle.pump(ms(0)), Pump::Quiet);
        assert_eq!(lifecycle.state(), LifecycleState::Observing);
        assert_eq!(lifecycle.pump(ms(1000)), Pump::Quiet);
    }

    #[test]
    fn test_height_only_changes_are_ignored() {
        let (observer, mut lifecycle) = observing();
        observer.notify(&1, ResizeEntry::new(300.0, 50.0));
        observer.notify(&1, ResizeEntry::new(300.0, 90.0));
        lifecycle.pump(ms(0));
        assert_eq!(lifecycle.state(), LifecycleState::Observing);
    }

    #[test]
    fn test_debounce_extends_and_fires_once() {
        let (observer, mut lifecycle) = observing();
        observer.notify(&1, ResizeEntry::new(300.0, 50.0));
        lifecycle.pump(ms(0));

        observer.notify(&1, ResizeEntry::new(280.0, 50.0));
        assert_eq!(lifecycle.pump(ms(10)), Pump::Quiet);
        observer.notify(&1, ResizeEntry::new(260.0, 50.0));
        assert_eq!(lifecycle.pump(ms(100)), Pump::Quiet);
        assert_eq!(
            lifecycle.state(),
            LifecycleState::Debouncing { deadline: ms(300) }
        );
        assert_eq!(lifecycle.pump(ms(299)), Pump::Quiet);
        assert_eq!(lifecycle.pump(ms(300)), Pump::Due);

        lifecycle.schedule_resplit();
        assert_eq!(lifecycle.state(), LifecycleState::Resplitting);
        assert_eq!(lifecycle.pump(ms(400)), Pump::Quiet);
        lifecycle.finish_resplit();
        assert_eq!(lifecycle.state(), LifecycleState::Observing);
    }

    #[test]
    fn test_changes_while_resplitting_do_not_reschedule() {
        let (observer, mut lifecycle) = observing();
        observer.notify(&1, ResizeEntry::new(300.0, 50.0));
        observer.notify(&1, ResizeEntry::new(200.0, 50.0));
        lifecycle.pump(ms(0));
        lifecycle.pump(ms(200));
        lifecycle.schedule_resplit();
        observer.notify(&1, ResizeEntry::new(150.0, 50.0));
        assert_eq!(lifecycle.pump(ms(250)), Pump::Quiet);
        assert_eq!(lifecycle.state(), LifecycleState::Resplitting);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (observer, mut lifecycle) = observing();
        assert_eq!(observer.active(), 1);
        lifecycle.dispose();
        lifecycle.dispose();
        assert_eq!(observer.active(), 0);
        assert_eq!(observer.disconnects(), 1);
        assert_eq!(lifecycle.state(), LifecycleState::Disposed);
        assert_eq!(observer.notify(&1, ResizeEntry::new(10.0, 10.0)), 0);
    }

    #[test]
    fn test_dispose_clears_pending_debounce() {
        let (observer, mut lifecycle) = observing();
        observer.notify(&1, ResizeEntry::new(300.0, 50.0));
        observer.notify(&1, ResizeEntry::new(200.0, 50.0));
        lifecycle.pump(ms(0));
        lifecycle.dispose();
        assert_eq!(lifecycle.pump(ms(1000)), Pump::Quiet);
        assert_eq!(lifecycle.state(), LifecycleState::Disposed);
    }

    #[test]
    fn test_notify_targets_only_matching_node() {
        let (observer, mut lifecycle) = observing();
        assert_eq!(observer.notify(&2, ResizeEntry::new(300.0, 50.0)), 0);
        assert_eq!(observer.notify(&1, ResizeEntry::new(300.0, 50.0)), 1);
        lifecycle.pump(ms(0));
    }

    #[test]
    fn test_start_after_dispose_is_ignored() {
        let mut observer = ChannelObserver::new();
        let mut lifecycle = Lifecycle::new(ms(200));
        lifecycle.dispose();
        lifecycle.start(observer.observe(&1));
        assert_eq!(lifecycle.state(), LifecycleState::Disposed);
    }
}
