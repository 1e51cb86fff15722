//! Macros for declaring state key sets.

/// Generate a key enum with its [`crate::core::StateKey`] implementation.
///
/// Each variant is paired with its stable string name, the form host layers
/// and trace records use.
///
/// # Example
///
/// ```
/// use cascade::key_enum;
/// use cascade::core::StateKey;
///
/// key_enum! {
///     pub enum LifeKey {
///         Loading => "loading",
///         Loaded => "loaded",
///         Started => "started",
///         Error => "error",
///     }
/// }
///
/// assert_eq!(LifeKey::Started.name(), "started");
/// assert_eq!(LifeKey::ALL.len(), 4);
/// ```
#[macro_export]
macro_rules! key_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $key_name:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::StateKey for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),*];

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $key_name),*
                }
            }
        }
    };
}
