//! Per-run cache of policy-assignment managed identities.

use std::collections::HashMap;

use crate::types::{ManagedIdentity, PolicyAssignmentId};

/// Lazily built mapping from policy assignment id to its managed identity.
///
/// Scoped to a single applier run and discarded at run end. A "no identity"
/// answer is cached too, so together with the strictly sequential processing
/// of additions this guarantees at most one external identity lookup per
/// distinct assignment id per run.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: HashMap<PolicyAssignmentId, Option<ManagedIdentity>>,
}

impl IdentityCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached resolution. The outer `Option` distinguishes "never
    /// looked up" from a cached "assignment has no identity".
    #[must_use]
    pub fn get(&self, assignment_id: &PolicyAssignmentId) -> Option<&Option<ManagedIdentity>> {
        self.entries.get(assignment_id)
    }

    /// Record the result of a lookup, identity or not.
    pub fn insert(
        &mut self,
        assignment_id: PolicyAssignmentId,
        identity: Option<ManagedIdentity>,
    ) {
        self.entries.insert(assignment_id, identity);
    }

    /// Number of cached resolutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrincipalId;

    #[test]
    fn insert_then_get_round_trips() {
        let mut cache = IdentityCache::new();
        let id = PolicyAssignmentId::new("/providers/pa1");
        assert!(cache.get(&id).is_none());

        cache.insert(id.clone(), Some(ManagedIdentity::new("p-123")));
        let identity = cache.get(&id).expect("cached").as_ref().expect("identity");
        assert_eq!(identity.principal_id, PrincipalId::new("p-123"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn negative_resolutions_are_cached() {
        let mut cache = IdentityCache::new();
        let id = PolicyAssignmentId::new("/providers/pa2");
        cache.insert(id.clone(), None);
        assert_eq!(cache.get(&id), Some(&None));
    }
}
