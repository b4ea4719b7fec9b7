use dashmap::DashMap;
use rustc_hash::FxHashSet;

/// Reverse-dependency index used by incremental invalidation.
///
/// Every member-existence check records a reference edge
/// (caller → declaring member); a miss records a reference to the
/// *missing* member so the caller can be re-validated once the member
/// appears. Recording happens through `&self` during analysis.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    member_references: DashMap<String, FxHashSet<String>>,
    missing_member_references: DashMap<String, FxHashSet<String>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `referencer` (a method id or a file path) touched the
    /// declared member `member_id`.
    pub fn add_member_reference(&self, referencer: &str, member_id: &str) {
        self.member_references
            .entry(member_id.to_lowercase())
            .or_default()
            .insert(referencer.to_string());
    }

    /// Record a reference to a member that does not (yet) exist.
    pub fn add_missing_member_reference(&self, referencer: &str, member_id: &str) {
        self.missing_member_references
            .entry(member_id.to_lowercase())
            .or_default()
            .insert(referencer.to_string());
    }

    pub fn referencers_of(&self, member_id: &str) -> FxHashSet<String> {
        self.member_references
            .get(&member_id.to_lowercase())
            .map(|set| set.clone())
            .unwrap_or_default()
    }

    pub fn referencers_of_missing(&self, member_id: &str) -> FxHashSet<String> {
        self.missing_member_references
            .get(&member_id.to_lowercase())
            .map(|set| set.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.member_references.clear();
        self.missing_member_references.clear();
    }
}
