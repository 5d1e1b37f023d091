//! Definition ids.

use crate::Idx;

/// Unique id for a named definition (function, method, const, field owner).
///
/// Assigned densely by name resolution; `DUMMY` marks "no definition".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefId(pub u32);

impl DefId {
    pub const DUMMY: DefId = DefId(u32::MAX);

    pub fn is_dummy(self) -> bool {
        self == Self::DUMMY
    }
}

impl Idx for DefId {
    fn from_usize(idx: usize) -> Self {
        assert!(idx < u32::MAX as usize);
        DefId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}
