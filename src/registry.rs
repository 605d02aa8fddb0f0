//! In-memory filter group registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::filter::FilterGroup;

/// Mapping of group id to its registered definition.
///
/// The registry stores shared references; callers keep ownership of the
/// group they built.
pub struct FilterGroupRegistry<E> {
    groups: BTreeMap<String, Arc<FilterGroup<E>>>,
}

impl<E> FilterGroupRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Inserts or replaces a group, returning the previous definition.
    pub fn register(
        &mut self,
        group_id: impl Into<String>,
        group: impl Into<Arc<FilterGroup<E>>>,
    ) -> Option<Arc<FilterGroup<E>>> {
        self.groups.insert(group_id.into(), group.into())
    }

    /// Removes a group. Unknown ids are a no-op.
    pub fn unregister(&mut self, group_id: &str) -> Option<Arc<FilterGroup<E>>> {
        self.groups.remove(group_id)
    }

    /// Looks up a group.
    #[must_use]
    pub fn get(&self, group_id: &str) -> Option<&Arc<FilterGroup<E>>> {
        self.groups.get(group_id)
    }

    /// Returns true if `group_id` is registered.
    #[must_use]
    pub fn contains(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Iterates groups sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterGroup<E>)> {
        self.groups.iter().map(|(id, g)| (id.as_str(), g.as_ref()))
    }

    /// Registered group ids, sorted.
    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of registered groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no group is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<E> Default for FilterGroupRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for FilterGroupRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            groups: self.groups.clone(),
        }
    }
}

impl<E> std::fmt::Debug for FilterGroupRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.groups.iter()).finish()
    }
}
