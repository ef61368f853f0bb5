#![allow(unused_macros)]

/// Declares a strongly-typed arena index.
///
/// The generated type wraps a `u32` position inside one of the arenas owned by
/// [`crate::AbcFile`]. It is `Copy`, hashable and ordered, prints as `Name(index)` with `{:?}`
/// and as `<prefix><index>` with `{}`.
///
/// ```rust, ignore
/// arena_id!(
///     /// Handle of a module
///     ModuleId,
///     "m"
/// );
/// assert_eq!(ModuleId::new(3).to_string(), "m3");
/// ```
macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Creates a handle from a raw arena position.
            #[must_use]
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Returns the raw arena position of this handle.
            #[must_use]
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

/// Converts an arena length into the next handle, failing once the `u32` range is exhausted.
///
/// ```rust, ignore
/// let id = next_id!(ModuleId, self.modules);
/// ```
macro_rules! next_id {
    ($name:ident, $arena:expr) => {
        match u32::try_from($arena.len()) {
            Ok(index) => Ok($name::new(index)),
            Err(_) => Err(crate::Error::NotSupported),
        }
    };
}
