//! sablec-util - Foundation types for the Sable compiler
//!
//! Typed indices ([`Idx`], [`IndexVec`], [`define_idx!`]), interned strings
//! ([`Symbol`]) and definition ids ([`DefId`]). Every table in the compiler
//! is an `IndexVec` keyed by its own index type so that ids from different
//! spaces cannot be mixed up.

pub mod def_id;
pub mod index_vec;
pub mod symbol;

pub use def_id::DefId;
pub use index_vec::{Idx, IndexVec};
pub use symbol::Symbol;

// Re-export the hash maps used throughout the compiler.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;

/// Define a dense `u32` index type implementing [`Idx`].
///
/// The generated type carries an `INVALID` sentinel (`u32::MAX`) meaning
/// "absent"; pushing more than `u32::MAX` elements into a table panics.
#[macro_export]
macro_rules! define_idx {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Sentinel for "absent".
            pub const INVALID: $name = $name(u32::MAX);

            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl $crate::Idx for $name {
            fn from_usize(idx: usize) -> Self {
                assert!(idx < u32::MAX as usize);
                $name(idx as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}
