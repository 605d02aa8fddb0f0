//! Entity source contract and the one-shot load result.

use serde::{Deserialize, Serialize};

use crate::error::EntityLoadError;

/// External collaborator that yields the entity collection.
///
/// A source is asked exactly once per load cycle and reports either the
/// full collection or an [`EntityLoadError`]. Retries and cancellation are
/// the source's business.
pub trait EntitySource<E>: Send + Sync {
    /// Produce the full entity collection.
    fn load_entities(&self) -> Result<Vec<E>, EntityLoadError>;
}

impl<E, F> EntitySource<E> for F
where
    F: Fn() -> Result<Vec<E>, EntityLoadError> + Send + Sync,
{
    fn load_entities(&self) -> Result<Vec<E>, EntityLoadError> {
        self()
    }
}

/// Tri-state outcome of the entity load.
#[derive(Debug, Clone)]
pub enum EntityLoad<E> {
    /// Not yet available.
    Pending,
    /// The full collection, in source order.
    Loaded(Vec<E>),
    /// The source reported a failure.
    Failed(EntityLoadError),
}

impl<E> EntityLoad<E> {
    /// Entities if loaded.
    #[must_use]
    pub fn entities(&self) -> Option<&[E]> {
        match self {
            Self::Loaded(entities) => Some(entities),
            _ => None,
        }
    }

    /// The load error if failed.
    #[must_use]
    pub const fn error(&self) -> Option<&EntityLoadError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true while no outcome has been observed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Summary without the payload.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        match self {
            Self::Pending => LoadStatus::Pending,
            Self::Loaded(entities) => LoadStatus::Loaded {
                entity_count: entities.len(),
            },
            Self::Failed(_) => LoadStatus::Failed,
        }
    }
}

impl<E> Default for EntityLoad<E> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<E> From<Result<Vec<E>, EntityLoadError>> for EntityLoad<E> {
    fn from(result: Result<Vec<E>, EntityLoadError>) -> Self {
        match result {
            Ok(entities) => Self::Loaded(entities),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Payload-free view of an [`EntityLoad`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Pending,
    Loaded { entity_count: usize },
    Failed,
}
