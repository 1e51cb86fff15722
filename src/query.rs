//! Tri-state asynchronous resource queries.
//!
//! A [`Query`] bridges an asynchronous loader (a compiled module, a remote
//! asset) into the synchronous machine: it settles exactly once, and one-shot
//! completion subscriptions forward the outcome. Any actual waiting happens
//! in whatever host layer drives the loader; the query itself never blocks.

use crate::error::MachineError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Failure reported by an external resource loader.
///
/// Carried as state data rather than thrown across the machine boundary, so
/// consumers react to load failures through normal state observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct LoadFailure {
    /// Human-readable description of the underlying failure.
    pub message: String,
}

impl LoadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<LoadFailure> for MachineError {
    fn from(failure: LoadFailure) -> Self {
        MachineError::ResourceLoadFailure {
            message: failure.message,
        }
    }
}

/// Status of a query, without the payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QueryStatus {
    Pending,
    Done,
    Failed,
}

/// Full state of a query.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryState<T> {
    /// The resource is still loading.
    Pending,
    /// The resource resolved.
    Done(T),
    /// The loader reported failure.
    Failed(LoadFailure),
}

type Waiter<T> = Box<dyn FnOnce(&QueryState<T>)>;

struct QueryInner<T> {
    state: Rc<QueryState<T>>,
    waiters: Vec<Waiter<T>>,
}

/// Settle-once cell with one-shot completion subscriptions.
///
/// # Example
///
/// ```rust
/// use cascade::query::{Query, QueryStatus};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let query: Query<u32> = Query::new();
/// assert_eq!(query.status(), QueryStatus::Pending);
///
/// let seen = Rc::new(Cell::new(0));
/// let seen2 = Rc::clone(&seen);
/// query.once(move |state| {
///     if let cascade::query::QueryState::Done(value) = state {
///         seen2.set(*value);
///     }
/// });
///
/// query.complete(42);
/// assert_eq!(seen.get(), 42);
/// assert_eq!(query.status(), QueryStatus::Done);
/// ```
pub struct Query<T> {
    inner: Rc<RefCell<QueryInner<T>>>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Query<T> {
    /// Create a pending query.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(QueryInner {
                state: Rc::new(QueryState::Pending),
                waiters: Vec::new(),
            })),
        }
    }

    /// Current status, without touching the payload.
    pub fn status(&self) -> QueryStatus {
        match *self.inner.borrow().state {
            QueryState::Pending => QueryStatus::Pending,
            QueryState::Done(_) => QueryStatus::Done,
            QueryState::Failed(_) => QueryStatus::Failed,
        }
    }

    /// Clone of the current state.
    pub fn state(&self) -> QueryState<T>
    where
        T: Clone,
    {
        (*self.inner.borrow().state).clone()
    }

    /// Settle the query with a resolved resource. Ignored if already settled.
    pub fn complete(&self, value: T) {
        self.settle(QueryState::Done(value));
    }

    /// Settle the query with a failure. Ignored if already settled.
    pub fn fail(&self, failure: LoadFailure) {
        self.settle(QueryState::Failed(failure));
    }

    /// One-shot completion subscription.
    ///
    /// If the query is already settled the callback runs immediately;
    /// otherwise it runs exactly once at settle time and is then dropped.
    /// The unsubscribe is built in: a waiter is consumed by delivery.
    pub fn once<F>(&self, callback: F)
    where
        F: FnOnce(&QueryState<T>) + 'static,
    {
        let settled = {
            let inner = self.inner.borrow();
            match *inner.state {
                QueryState::Pending => None,
                _ => Some(Rc::clone(&inner.state)),
            }
        };

        match settled {
            Some(state) => callback(&state),
            None => self.inner.borrow_mut().waiters.push(Box::new(callback)),
        }
    }

    fn settle(&self, state: QueryState<T>) {
        let (state, waiters) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(*inner.state, QueryState::Pending) {
                return;
            }
            inner.state = Rc::new(state);
            (Rc::clone(&inner.state), std::mem::take(&mut inner.waiters))
        };

        // Borrow released above: waiters may re-enter the query.
        for waiter in waiters {
            waiter(&state);
        }
    }
}

impl<T: 'static> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}
