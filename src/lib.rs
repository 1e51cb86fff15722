//! Cascade: an event-keyed state machine with synchronous transition cascades.
//!
//! A machine owns one current state drawn from a closed, compile-time key
//! set. It changes state only when an event is emitted into its channel:
//! the initial emission at construction, an external emission, or an
//! auto-transition produced by the listener map. A single emission cascades
//! synchronously to a fixed point before the emitting call returns, so
//! callers only ever observe settled states.
//!
//! # Core Concepts
//!
//! - **Keys**: a closed state space via the [`core::StateKey`] trait
//! - **Events**: `(key, payload)` sum types via the [`core::StateEvent`] trait
//! - **Listener map**: per-key transition functions driving the cascade
//! - **Subscriptions**: per-key and cross-key observation with removable
//!   tokens, safe to mutate mid-cascade
//!
//! # Example
//!
//! ```rust
//! use cascade::core::StateEvent;
//! use cascade::machine::{ListenerMap, StateMachine};
//! use cascade::key_enum;
//!
//! key_enum! {
//!     pub enum Key {
//!         Str => "str",
//!         Num => "num",
//!     }
//! }
//!
//! #[derive(Clone, PartialEq, Debug)]
//! enum Event {
//!     Str(String),
//!     Num(i64),
//! }
//!
//! impl StateEvent for Event {
//!     type Key = Key;
//!
//!     fn key(&self) -> Key {
//!         match self {
//!             Self::Str(_) => Key::Str,
//!             Self::Num(_) => Key::Num,
//!         }
//!     }
//! }
//!
//! // "str" auto-transitions to "num"; "num" is terminal.
//! let listeners = ListenerMap::new().transition(Key::Str, |event: &Event| {
//!     match event {
//!         Event::Str(_) => Some(Event::Num(42)),
//!         _ => None,
//!     }
//! });
//!
//! let machine = StateMachine::new(listeners, Event::Str("life".into())).unwrap();
//! assert_eq!(machine.state(), Event::Num(42));
//! ```

pub mod core;
pub mod error;
pub mod lifecycle;
pub mod machine;
pub mod query;

// Re-export commonly used types
pub use crate::core::{StateEvent, StateKey, TraceEntry, TransitionTrace};
pub use crate::error::MachineError;
pub use crate::machine::{ListenerMap, ListenerToken, StateMachine, MAX_CASCADE_DEPTH};
pub use crate::query::{LoadFailure, Query, QueryState, QueryStatus};
