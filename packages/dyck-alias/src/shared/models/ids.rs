//! Handle types for IR entities
//!
//! Every IR entity is addressed by a dense index assigned at creation time.
//! Handles are `Copy`, totally ordered and hash cheaply, so tables keyed by
//! them behave identically across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Position in the owning table
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Any SSA value: function, global, argument, instruction result or constant
    ValueId,
    "%"
);
define_handle!(
    /// A function definition or declaration
    FunctionId,
    "fn#"
);
define_handle!(
    /// A global variable
    GlobalId,
    "@"
);
