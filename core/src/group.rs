//! Namespace (`group_id`) default resolution.
//!
//! There is no multi-tenant auth in this service; `group_id` is an advisory
//! partition key. `GroupResolver` only decides what namespace a request
//! falls into when the caller doesn't say, mirroring the source's
//! `graphiti.group_id` fallback.

use crate::types::GroupId;

#[derive(Debug, Clone)]
pub struct GroupResolver {
    default_group_id: Option<GroupId>,
}

impl GroupResolver {
    pub fn new(default_group_id: Option<GroupId>) -> Self {
        Self { default_group_id }
    }

    /// Resolve a request's group filter. An empty `requested` list falls
    /// back to the configured default; if neither is present, returns an
    /// empty list (the caller is expected to treat that as "match nothing",
    /// per B2 — not an error).
    pub fn resolve(&self, requested: &[GroupId]) -> Vec<GroupId> {
        if !requested.is_empty() {
            return requested.to_vec();
        }
        self.default_group_id.clone().into_iter().collect()
    }

    /// Resolve a single group_id for writes (ingestion), defaulting the same way.
    pub fn resolve_one(&self, requested: Option<GroupId>) -> Option<GroupId> {
        requested.or_else(|| self.default_group_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_empty() {
        let resolver = GroupResolver::new(Some(GroupId::new("default")));
        assert_eq!(resolver.resolve(&[]), vec![GroupId::new("default")]);
    }

    #[test]
    fn explicit_request_wins_over_default() {
        let resolver = GroupResolver::new(Some(GroupId::new("default")));
        assert_eq!(
            resolver.resolve(&[GroupId::new("g1")]),
            vec![GroupId::new("g1")]
        );
    }

    #[test]
    fn empty_when_both_absent() {
        let resolver = GroupResolver::new(None);
        assert!(resolver.resolve(&[]).is_empty());
    }
}
