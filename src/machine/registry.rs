//! Listener registry with snapshot-on-iterate semantics.
//!
//! Emission never iterates the live registry: the scheduled callbacks are
//! copied out first, so listeners may register or remove entries (including
//! themselves) mid-cascade without skipping or double-invoking anything
//! already scheduled. One-shot entries are removed at snapshot time, before
//! their invocation, which is what makes them exactly-once even when the
//! callback re-enters the machine.

use crate::core::{StateEvent, StateKey};
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Shared side-effect callback. Listeners never drive transitions; that is
/// the exclusive job of the transition functions in the listener map.
pub(crate) type Callback<E> = Rc<dyn Fn(&E)>;

/// Opaque handle identifying one listener registration.
///
/// Tokens are uuid-backed, so a token minted by another machine instance
/// matches nothing here and removal with it is a no-op.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerToken<K: StateKey> {
    id: Uuid,
    scope: Scope<K>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Scope<K> {
    /// Listener for one key's emissions.
    Key(K),
    /// Cross-key subscriber observing every emission.
    Any,
}

struct Entry<E> {
    id: Uuid,
    callback: Callback<E>,
    once: bool,
}

pub(crate) struct ListenerRegistry<E: StateEvent> {
    by_key: HashMap<E::Key, Vec<Entry<E>>>,
    any: Vec<Entry<E>>,
}

impl<E: StateEvent> ListenerRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            any: Vec::new(),
        }
    }

    pub(crate) fn insert(
        &mut self,
        key: E::Key,
        callback: Callback<E>,
        once: bool,
    ) -> ListenerToken<E::Key> {
        let id = Uuid::new_v4();
        self.by_key.entry(key).or_default().push(Entry {
            id,
            callback,
            once,
        });
        ListenerToken {
            id,
            scope: Scope::Key(key),
        }
    }

    pub(crate) fn insert_any(&mut self, callback: Callback<E>) -> ListenerToken<E::Key> {
        let id = Uuid::new_v4();
        self.any.push(Entry {
            id,
            callback,
            once: false,
        });
        ListenerToken {
            id,
            scope: Scope::Any,
        }
    }

    /// Remove the registration behind `token`. Unknown tokens are a no-op.
    pub(crate) fn remove(&mut self, token: ListenerToken<E::Key>) {
        match token.scope {
            Scope::Key(key) => {
                if let Some(entries) = self.by_key.get_mut(&key) {
                    entries.retain(|entry| entry.id != token.id);
                }
            }
            Scope::Any => self.any.retain(|entry| entry.id != token.id),
        }
    }

    pub(crate) fn clear_key(&mut self, key: E::Key) {
        self.by_key.remove(&key);
    }

    pub(crate) fn clear(&mut self) {
        self.by_key.clear();
        self.any.clear();
    }

    /// Copy out the callbacks scheduled for `key`, in registration order.
    /// One-shot entries are unregistered here, before they run.
    pub(crate) fn snapshot_key(&mut self, key: E::Key) -> Vec<Callback<E>> {
        let Some(entries) = self.by_key.get_mut(&key) else {
            return Vec::new();
        };
        let scheduled = entries
            .iter()
            .map(|entry| Rc::clone(&entry.callback))
            .collect();
        entries.retain(|entry| !entry.once);
        scheduled
    }

    /// Copy out the cross-key subscribers, in registration order.
    pub(crate) fn snapshot_any(&self) -> Vec<Callback<E>> {
        self.any
            .iter()
            .map(|entry| Rc::clone(&entry.callback))
            .collect()
    }
}
