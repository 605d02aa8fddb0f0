use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatcherId(Uuid);

impl WatcherId {
    /// Create a new random watcher id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for WatcherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutation that caused a recomputation.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeCause {
    Registered { group_id: String },
    Unregistered { group_id: String },
    SelectionChanged { group_id: String },
    SelectionsCleared,
    EntitiesLoaded { entity_count: usize },
    EntityLoadFailed { message: String },
}

impl ChangeCause {
    /// The group the change concerns, if it is group-scoped.
    #[must_use]
    pub fn group_id(&self) -> Option<&str> {
        match self {
            Self::Registered { group_id }
            | Self::Unregistered { group_id }
            | Self::SelectionChanged { group_id } => Some(group_id),
            Self::SelectionsCleared | Self::EntitiesLoaded { .. } | Self::EntityLoadFailed { .. } => {
                None
            }
        }
    }
}

/// Notification that the aggregate state moved to a new revision.
///
/// Carries no state: watchers read the store (or take a snapshot) to see
/// the new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// Store revision after the change.
    pub revision: u64,
    /// What triggered the recomputation.
    pub cause: ChangeCause,
    /// When the recomputation finished.
    pub at: DateTime<Utc>,
}
