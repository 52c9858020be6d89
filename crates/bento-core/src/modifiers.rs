//! Access and durability tiers.
//!
//! Both tiers are totally ordered. When a definition names several
//! supertypes, the combined tier is the *lowest* one among the members
//! (see [`Durability::lowest`] and [`Access::lowest`]).

use std::fmt;

use bitflags::bitflags;

/// Visibility tier of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Access {
    /// Visible only inside the owning definition.
    Local,
    /// Visible anywhere in the same site.
    Site,
    /// Visible everywhere.
    #[default]
    Public,
}

/// Cache-policy tier governing reuse of resolved results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Durability {
    /// Rebuilt on every resolution.
    #[default]
    Dynamic,
    /// Reused within one context (and its shared clones).
    InContext,
    /// Reused across every context sharing the global cache.
    Global,
    /// Built once and reused unconditionally.
    Static,
}

macro_rules! lowest_of {
    ($ty:ty) => {
        impl $ty {
            /// Fold a group of tiers, the lowest governs.
            ///
            /// Returns `None` for an empty group.
            pub fn lowest<I: IntoIterator<Item = $ty>>(tiers: I) -> Option<$ty> {
                tiers.into_iter().min()
            }
        }
    };
}

lowest_of!(Access);
lowest_of!(Durability);

impl Durability {
    /// Whether results of this tier may be cached at all.
    pub fn is_cacheable(self) -> bool {
        self > Durability::Dynamic
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Durability::Dynamic => "dynamic",
            Durability::InContext => "in-context",
            Durability::Global => "global",
            Durability::Static => "static",
        }
    }
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Local => "local",
            Access::Site => "site",
            Access::Public => "public",
        }
    }
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Boolean traits of a definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DefinitionFlags: u8 {
        /// Declared abstract; has no contents of its own.
        const ABSTRACT = 1 << 0;
        /// Bound to an opaque host value whose hierarchy is unknowable.
        const EXTERNAL = 1 << 1;
        /// Stands for a parameter that aliases another definition.
        const PARAMETER_ALIAS = 1 << 2;
    }
}

impl DefinitionFlags {
    /// Abstractness of a multi-supertype group: abstract only when every
    /// member is abstract (`concrete < abstract`, lowest governs).
    pub fn group_is_abstract<I: IntoIterator<Item = DefinitionFlags>>(members: I) -> bool {
        let mut any = false;
        for flags in members {
            if !flags.contains(DefinitionFlags::ABSTRACT) {
                return false;
            }
            any = true;
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_durability_governs() {
        let tier = Durability::lowest([Durability::Static, Durability::InContext, Durability::Global]);
        assert_eq!(tier, Some(Durability::InContext));
    }

    #[test]
    fn lowest_access_governs() {
        assert_eq!(Access::lowest([Access::Public, Access::Local]), Some(Access::Local));
        assert_eq!(Access::lowest(Vec::new()), None);
    }

    #[test]
    fn only_dynamic_is_uncacheable() {
        assert!(!Durability::Dynamic.is_cacheable());
        assert!(Durability::InContext.is_cacheable());
        assert!(Durability::Static.is_cacheable());
    }

    #[test]
    fn group_abstractness() {
        let a = DefinitionFlags::ABSTRACT;
        let c = DefinitionFlags::empty();
        assert!(DefinitionFlags::group_is_abstract([a, a]));
        assert!(!DefinitionFlags::group_is_abstract([a, c]));
        assert!(!DefinitionFlags::group_is_abstract(Vec::new()));
    }
}
