//! Core vocabulary of the state machine:
//! - Key sets via the [`StateKey`] trait (closed, exhaustively enumerated)
//! - Events via the [`StateEvent`] trait (one payload type per key)
//! - Applied-event tracing via [`TransitionTrace`]
//!
//! Everything here is a plain value or a pure trait method; all mutation
//! lives in [`crate::machine`].

mod event;
mod key;
pub mod macros;
mod trace;

pub use event::StateEvent;
pub use key::StateKey;
pub use trace::{TraceEntry, TransitionTrace};
