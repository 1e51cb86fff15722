//! State events: a key paired with the payload that key carries.

use super::key::StateKey;
use std::fmt::Debug;

/// Trait for state machine events.
///
/// An event is a `(key, data)` pair modeled as a sum type: one variant per
/// [`StateKey`], each carrying its own payload type. The machine's current
/// state is always the most recently applied event.
///
/// Payloads may hold opaque host resources (a rendering surface, a module
/// handle), so events are only required to be cloneable and debuggable.
/// There is no serialization bound, and no `Send`/`Sync` bound because the
/// machine is single-threaded by design.
///
/// # Example
///
/// ```rust
/// use cascade::core::{StateEvent, StateKey};
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
/// assert_eq!(DemoEvent::Num(42).key(), DemoKey::Num);
/// ```
pub trait StateEvent: Clone + Debug + 'static {
    /// The closed key set this event ranges over.
    type Key: StateKey;

    /// The key naming this event's variant.
    fn key(&self) -> Self::Key;
}
