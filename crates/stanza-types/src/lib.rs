//! The stanza type lattice.
//!
//! A [`Union`] is an ordered disjunction of [`Atomic`] parts. All operations
//! here are pure: combination and substitution return new unions and never
//! mutate shared instances.
//!
//! Named-object subtyping needs class-hierarchy knowledge, which lives in
//! the codebase crate; the [`HierarchyResolver`] trait is the seam.

mod atomic;
mod combine;
mod compare;
mod union;

pub use atomic::{Atomic, AtomicKind};
pub use combine::combine_types;
pub use compare::{TypeComparison, union_contained_by};
pub use union::Union;

/// Class-hierarchy queries needed for named-object containment.
pub trait HierarchyResolver {
    /// Whether `child` is a (transitive) subclass of `parent`.
    fn is_descendant_of(&self, child: &str, parent: &str) -> bool;
}

/// Resolver that knows no hierarchy; only exact name matches hold.
pub struct NoHierarchy;

impl HierarchyResolver for NoHierarchy {
    fn is_descendant_of(&self, _child: &str, _parent: &str) -> bool {
        false
    }
}
