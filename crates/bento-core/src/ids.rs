//! Stable handles into the definition arena.

use std::fmt;

/// Handle of a named definition stored in the definition graph.
///
/// Handles are plain indices; ownership and supertype edges are expressed
/// with handles rather than shared references, so the graph never forms
/// reference cycles.
///
/// # Example
///
/// ```
/// use bento_core::DefId;
///
/// let root = DefId::ROOT;
/// assert_eq!(root.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(u32);

impl DefId {
    /// The root namespace, the only definition without an owner.
    pub const ROOT: DefId = DefId(0);

    /// Create a handle from a raw arena index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying arena index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def_{}", self.0)
    }
}

impl From<u32> for DefId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}
