//! Derived per-group state and aggregate snapshots.
//!
//! These types are what consumers read. They are serializable so a
//! rendering layer can receive them as JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EntityLoadError;

/// Selection flag and match count of one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    /// Filter id within its group.
    pub filter_id: String,
    /// Whether the filter is currently selected.
    pub is_selected: bool,
    /// Entities matching this filter among those passing every other group's selections.
    pub match_count: usize,
}

/// Per-filter detail of a group whose entities are available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReadyState {
    filters: Vec<FilterState>,
}

impl ReadyState {
    pub(crate) fn new(filters: Vec<FilterState>) -> Self {
        Self { filters }
    }

    /// State of a single filter.
    #[must_use]
    pub fn get(&self, filter_id: &str) -> Option<&FilterState> {
        self.filters.iter().find(|f| f.filter_id == filter_id)
    }

    /// Match count of a filter, if the group defines it.
    #[must_use]
    pub fn match_count(&self, filter_id: &str) -> Option<usize> {
        self.get(filter_id).map(|f| f.match_count)
    }

    /// Selected flag of a filter, if the group defines it.
    #[must_use]
    pub fn is_selected(&self, filter_id: &str) -> Option<bool> {
        self.get(filter_id).map(|f| f.is_selected)
    }

    /// All filter states in group order.
    #[must_use]
    pub fn filters(&self) -> &[FilterState] {
        &self.filters
    }

    /// Number of reported filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the group has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// State of one registered filter group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FilterGroupState {
    /// Entities are not yet available.
    Loading,
    /// The entity load failed; no per-filter detail exists.
    Error(EntityLoadError),
    /// Per-filter selection flags and match counts.
    Ready(ReadyState),
}

impl FilterGroupState {
    /// Returns true for [`FilterGroupState::Loading`].
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true for [`FilterGroupState::Error`].
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Per-filter detail when ready.
    #[must_use]
    pub const fn as_ready(&self) -> Option<&ReadyState> {
        match self {
            Self::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    /// The load error when failed.
    #[must_use]
    pub const fn error(&self) -> Option<&EntityLoadError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Owned, read-only copy of the aggregate state at one revision.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSnapshot<E> {
    /// Store revision the snapshot was taken at.
    pub revision: u64,
    /// When the state was last recomputed.
    pub computed_at: DateTime<Utc>,
    /// State of every registered group.
    pub groups: BTreeMap<String, FilterGroupState>,
    /// Entities matching every group's selections, in source order.
    pub matching: Vec<E>,
}

impl<E> AggregateSnapshot<E> {
    /// State of one group.
    #[must_use]
    pub fn group(&self, group_id: &str) -> Option<&FilterGroupState> {
        self.groups.get(group_id)
    }
}
