//! Transition listener maps.

use crate::core::StateEvent;
use std::collections::HashMap;
use std::rc::Rc;

/// Auto-transition function: given the applied event's payload, optionally
/// produce the next state. Returning `None` leaves the state unchanged for
/// that emission.
pub(crate) type TransitionFn<E> = Rc<dyn Fn(&E) -> Option<E>>;

/// Mapping from a subset of keys to their auto-transition functions.
///
/// Keys without a transition are terminal with respect to auto-transition;
/// consumers may still observe them through `on`/`subscribe`. Registering a
/// transition twice for the same key replaces the earlier one.
///
/// # Example
///
/// ```rust
/// use cascade::core::StateEvent;
/// use cascade::machine::{ListenerMap, StateMachine};
/// use cascade::key_enum;
///
/// key_enum! {
///     pub enum DemoKey {
///         Str => "str",
///         Num => "num",
///     }
/// }
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum DemoEvent {
///     Str(String),
///     Num(i64),
/// }
///
/// impl StateEvent for DemoEvent {
///     type Key = DemoKey;
///
///     fn key(&self) -> DemoKey {
///         match self {
///             Self::Str(_) => DemoKey::Str,
///             Self::Num(_) => DemoKey::Num,
///         }
///     }
/// }
///
/// // "str" hands off to "num"; "num" is terminal.
/// let listeners = ListenerMap::new()
///     .transition(DemoKey::Str, |event: &DemoEvent| match event {
///         DemoEvent::Str(s) => Some(DemoEvent::Num(s.len() as i64)),
///         _ => None,
///     });
///
/// let machine = StateMachine::new(listeners, DemoEvent::Str("life".into())).unwrap();
/// assert_eq!(machine.state(), DemoEvent::Num(4));
/// ```
pub struct ListenerMap<E: StateEvent> {
    transitions: HashMap<E::Key, TransitionFn<E>>,
}

impl<E: StateEvent> ListenerMap<E> {
    /// Create an empty map. A machine built from it never auto-transitions.
    pub fn new() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    /// Attach an auto-transition function to `key`.
    pub fn transition<F>(mut self, key: E::Key, f: F) -> Self
    where
        F: Fn(&E) -> Option<E> + 'static,
    {
        self.transitions.insert(key, Rc::new(f));
        self
    }

    /// Number of keys with a transition attached.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// True when no key has a transition attached.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub(crate) fn into_transitions(self) -> HashMap<E::Key, TransitionFn<E>> {
        self.transitions
    }
}

impl<E: StateEvent> Default for ListenerMap<E> {
    fn default() -> Self {
        Self::new()
    }
}
