//! State keys: the closed identifier set of a machine's state space.
//!
//! A key names one variant of the state space. The set of keys is fixed at
//! compile time by enumerating every variant in `ALL`, which is what makes
//! emission exhaustiveness-checkable instead of relying on runtime lookups.

use crate::error::MachineError;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for the key set of a state machine.
///
/// Implementors are plain field-less enums, one variant per state key. The
/// [`crate::key_enum!`] macro generates conforming implementations.
///
/// Because keys are enum variants, emitting an undeclared key is a compile
/// error. Strings enter the system only from host layers that address keys
/// by name; those go through [`StateKey::from_name`], which is where
/// [`MachineError::InvalidKey`] is produced.
///
/// # Example
///
/// ```rust
/// use cascade::core::StateKey;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum LifeKey {
///     Loading,
///     Loaded,
///     Started,
///     Error,
/// }
///
/// impl StateKey for LifeKey {
///     const ALL: &'static [Self] = &[
///         Self::Loading,
///         Self::Loaded,
///         Self::Started,
///         Self::Error,
///     ];
///
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Loading => "loading",
///             Self::Loaded => "loaded",
///             Self::Started => "started",
///             Self::Error => "error",
///         }
///     }
/// }
///
/// assert_eq!(LifeKey::from_name("loaded").unwrap(), LifeKey::Loaded);
/// assert!(LifeKey::from_name("bogus").is_err());
/// ```
pub trait StateKey: Copy + PartialEq + Eq + Hash + Debug + 'static {
    /// Every key of the state space, in declaration order.
    const ALL: &'static [Self];

    /// The key's stable string name, for display and trace records.
    fn name(&self) -> &'static str;

    /// Resolve a key from its string name.
    ///
    /// Fails with [`MachineError::InvalidKey`] for names outside the declared
    /// state space. This is the runtime half of the invalid-key check; the
    /// typed API is checked at compile time.
    fn from_name(name: &str) -> Result<Self, MachineError> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.name() == name)
            .ok_or_else(|| MachineError::InvalidKey {
                name: name.to_string(),
            })
    }
}
