//! The event-keyed state machine.
//!
//! A [`StateMachine`] owns the current state, a per-key notification channel
//! and a registry of listeners. It changes state only when an event is
//! emitted into it: the initial emission at construction, an external
//! [`StateMachine::emit`], or an auto-transition produced by the listener
//! map. Auto-transitions are synchronous and chainable: a single emission
//! cascades to a fixed point before the emitting call returns, so callers
//! only ever observe settled states.

mod listeners;
mod registry;

pub use listeners::ListenerMap;
pub use registry::ListenerToken;

use crate::core::{StateEvent, StateKey, TraceEntry, TransitionTrace};
use crate::error::MachineError;
use listeners::TransitionFn;
use registry::{Callback, ListenerRegistry};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Maximum auto-transition steps per emission.
///
/// The machine does not detect transition cycles; a listener map whose
/// reachable keys keep producing next states fails with
/// [`MachineError::TransitionCycle`] at this depth instead of hanging.
pub const MAX_CASCADE_DEPTH: usize = 64;

struct MachineInner<E: StateEvent> {
    state: RefCell<E>,
    // Auto-transitions are listeners too: clear() releases them along with
    // everything in the registry.
    transitions: RefCell<HashMap<E::Key, TransitionFn<E>>>,
    registry: RefCell<ListenerRegistry<E>>,
    trace: RefCell<TransitionTrace>,
}

/// Event-driven state machine over a closed key set.
///
/// The machine is a cheap-to-clone handle; clones share state, registry and
/// trace. It is single-threaded and cooperative: every listener invocation
/// and state mutation happens synchronously inside the emitting call stack,
/// and callbacks may re-enter the machine (`emit`, `off`, `clear`) because
/// no interior borrow is held across a callback.
///
/// # Example
///
/// ```rust
/// use cascade::core::StateEvent;
/// use cascade::machine::{ListenerMap, StateMachine};
/// use cascade::key_enum;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// key_enum! {
///     pub enum Key {
///         Str => "str",
///         Num => "num",
///     }
/// }
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Event {
///     Str(String),
///     Num(i64),
/// }
///
/// impl StateEvent for Event {
///     type Key = Key;
///
///     fn key(&self) -> Key {
///         match self {
///             Self::Str(_) => Key::Str,
///             Self::Num(_) => Key::Num,
///         }
///     }
/// }
///
/// let machine = StateMachine::new(
///     ListenerMap::new(),
///     Event::Str("life".into()),
/// ).unwrap();
///
/// let seen = Rc::new(Cell::new(0));
/// let seen2 = Rc::clone(&seen);
/// machine.on(Key::Num, move |_| seen2.set(seen2.get() + 1));
///
/// machine.emit(Event::Num(42)).unwrap();
/// assert_eq!(machine.state(), Event::Num(42));
/// assert_eq!(seen.get(), 1);
/// ```
pub struct StateMachine<E: StateEvent> {
    inner: Rc<MachineInner<E>>,
}

impl<E: StateEvent> Clone for StateMachine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: StateEvent> StateMachine<E> {
    /// Create a machine and immediately dispatch `initial`.
    ///
    /// Auto-transitions are wired before the initial dispatch, so a
    /// transition attached to `initial.key()` fires for the initial emission
    /// too, and construction settles the resulting cascade. The constructed
    /// machine's state is `initial` unless that cascade moved it.
    pub fn new(listeners: ListenerMap<E>, initial: E) -> Result<Self, MachineError> {
        let machine = Self {
            inner: Rc::new(MachineInner {
                state: RefCell::new(initial.clone()),
                transitions: RefCell::new(listeners.into_transitions()),
                registry: RefCell::new(ListenerRegistry::new()),
                trace: RefCell::new(TransitionTrace::new()),
            }),
        };
        machine.dispatch(&initial, 0)?;
        Ok(machine)
    }

    /// Clone of the current state.
    pub fn state(&self) -> E {
        self.inner.state.borrow().clone()
    }

    /// Key of the current state.
    pub fn key(&self) -> E::Key {
        self.inner.state.borrow().key()
    }

    /// Snapshot of the applied-event trace.
    pub fn trace(&self) -> TransitionTrace {
        self.inner.trace.borrow().clone()
    }

    /// Apply `event` as the current state and notify.
    ///
    /// The event's auto-transition (if any) runs first and may cascade; key
    /// listeners and cross-key subscribers for `event` are then invoked in
    /// registration order. Everything completes before this call returns.
    pub fn emit(&self, event: E) -> Result<(), MachineError> {
        self.apply(&event);
        self.dispatch(&event, 0)
    }

    /// Register `callback` for future emissions of `key`.
    ///
    /// Multiple callbacks per key are invoked in registration order. The
    /// returned token removes this registration via [`StateMachine::off`].
    pub fn on<F>(&self, key: E::Key, callback: F) -> ListenerToken<E::Key>
    where
        F: Fn(&E) + 'static,
    {
        self.inner
            .registry
            .borrow_mut()
            .insert(key, Rc::new(callback), false)
    }

    /// Register `callback` for the next emission of `key` only.
    ///
    /// The registration is removed before the callback runs, so it fires
    /// exactly once even if the callback re-enters the machine and causes
    /// `key` to be emitted again.
    pub fn once<F>(&self, key: E::Key, callback: F) -> ListenerToken<E::Key>
    where
        F: Fn(&E) + 'static,
    {
        self.inner
            .registry
            .borrow_mut()
            .insert(key, Rc::new(callback), true)
    }

    /// [`StateMachine::on`] addressed by key name, for stringly-typed hosts.
    ///
    /// Fails with [`MachineError::InvalidKey`] when `name` is outside the
    /// declared state space.
    pub fn on_named<F>(&self, name: &str, callback: F) -> Result<ListenerToken<E::Key>, MachineError>
    where
        F: Fn(&E) + 'static,
    {
        let key = E::Key::from_name(name)?;
        Ok(self.on(key, callback))
    }

    /// Remove one registration. Unknown or foreign tokens are a no-op.
    pub fn off(&self, token: ListenerToken<E::Key>) {
        self.inner.registry.borrow_mut().remove(token);
    }

    /// Remove all listeners for `key`, including its auto-transition.
    /// Current state is untouched; `key` becomes terminal.
    pub fn clear_key(&self, key: E::Key) {
        self.inner.registry.borrow_mut().clear_key(key);
        self.inner.transitions.borrow_mut().remove(&key);
    }

    /// Remove all listeners, subscribers and auto-transitions. Current state
    /// is untouched, but subsequent emissions invoke nothing.
    pub fn clear(&self) {
        self.inner.registry.borrow_mut().clear();
        self.inner.transitions.borrow_mut().clear();
    }

    /// Observe every emission regardless of key.
    ///
    /// Subscribers run after the emitted key's own listeners. They are for
    /// logging and debugging collaborators; driving transitions from one is
    /// the listener map's job, not theirs.
    pub fn subscribe<F>(&self, callback: F) -> ListenerToken<E::Key>
    where
        F: Fn(&E) + 'static,
    {
        self.inner.registry.borrow_mut().insert_any(Rc::new(callback))
    }

    /// Remove a cross-key subscription. Unknown tokens are a no-op.
    pub fn unsubscribe(&self, token: ListenerToken<E::Key>) {
        self.off(token);
    }

    fn apply(&self, event: &E) {
        let from = self.key().name();
        let to = event.key().name();
        *self.inner.state.borrow_mut() = event.clone();
        let trace = self.inner.trace.borrow().record(TraceEntry::now(from, to));
        *self.inner.trace.borrow_mut() = trace;
    }

    fn dispatch(&self, event: &E, depth: usize) -> Result<(), MachineError> {
        if depth >= MAX_CASCADE_DEPTH {
            return Err(MachineError::TransitionCycle {
                key: event.key().name(),
                limit: MAX_CASCADE_DEPTH,
            });
        }

        // Auto-transition first: the cascade settles before this event's own
        // listeners run, matching per-key registration order (transitions
        // are wired at construction, ahead of any `on`).
        let transition = self.inner.transitions.borrow().get(&event.key()).cloned();
        if let Some(transition) = transition {
            if let Some(next) = transition(event) {
                self.apply(&next);
                self.dispatch(&next, depth + 1)?;
            }
        }

        let scheduled: Vec<Callback<E>> =
            self.inner.registry.borrow_mut().snapshot_key(event.key());
        for callback in scheduled {
            callback(event);
        }

        let subscribers: Vec<Callback<E>> = self.inner.registry.borrow().snapshot_any();
        for callback in subscribers {
            callback(event);
        }

        Ok(())
    }
}
