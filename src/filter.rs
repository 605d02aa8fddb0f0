//! Filters and filter groups.
//!
//! A [`Filter`] is a named pure predicate over an entity. A [`FilterGroup`]
//! is an ordered set of filters whose selections combine with OR; groups
//! combine with AND.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{FacetError, FacetResult};

type Predicate<E> = dyn Fn(&E) -> bool + Send + Sync;

/// A pure predicate over an entity.
///
/// Predicates must not mutate shared state: counts are recomputed from
/// scratch on every change and must be deterministic.
pub struct Filter<E> {
    predicate: Arc<Predicate<E>>,
}

impl<E> Filter<E> {
    /// Wraps a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Builds a predicate that needs external context, such as the current
    /// user's id.
    ///
    /// The context is supplied once, at construction, and handed to the
    /// predicate on every evaluation.
    ///
    /// ```
    /// use kyrofacet::Filter;
    ///
    /// struct Repo { owner: String }
    ///
    /// let mine = Filter::with_context("alice".to_string(), |user: &String, repo: &Repo| {
    ///     &repo.owner == user
    /// });
    /// assert!(mine.matches(&Repo { owner: "alice".into() }));
    /// assert!(!mine.matches(&Repo { owner: "bob".into() }));
    /// ```
    pub fn with_context<C>(context: C, predicate: fn(&C, &E) -> bool) -> Self
    where
        C: Send + Sync + 'static,
        E: 'static,
    {
        Self::new(move |entity| predicate(&context, entity))
    }

    /// Matches entities whose extracted field equals `value`.
    pub fn equals<F>(extract: F, value: impl Into<String>) -> Self
    where
        F: Fn(&E) -> &str + Send + Sync + 'static,
        E: 'static,
    {
        let value = value.into();
        Self::new(move |entity| extract(entity) == value)
    }

    /// Matches entities whose extracted field matches a regular expression.
    pub fn regex<F>(extract: F, pattern: &str) -> FacetResult<Self>
    where
        F: Fn(&E) -> &str + Send + Sync + 'static,
        E: 'static,
    {
        let re = Regex::new(pattern).map_err(|e| FacetError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(move |entity| re.is_match(extract(entity))))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, entity: &E) -> bool {
        (self.predicate)(entity)
    }
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

/// An ordered mapping of filter id to [`Filter`].
///
/// Order is insertion order and is the order in which per-filter state is
/// reported.
pub struct FilterGroup<E> {
    filters: Vec<(String, Filter<E>)>,
}

impl<E> FilterGroup<E> {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Adds a filter, builder style.
    #[must_use]
    pub fn with_filter(mut self, id: impl Into<String>, filter: Filter<E>) -> Self {
        self.insert(id, filter);
        self
    }

    /// Adds a filter built from a bare predicate, builder style.
    #[must_use]
    pub fn with_predicate<F>(self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.with_filter(id, Filter::new(predicate))
    }

    /// Inserts a filter. An existing id keeps its position and gets the new predicate.
    pub fn insert(&mut self, id: impl Into<String>, filter: Filter<E>) {
        let id = id.into();
        if let Some(slot) = self.filters.iter_mut().find(|(k, _)| *k == id) {
            slot.1 = filter;
        } else {
            self.filters.push((id, filter));
        }
    }

    /// Looks up a filter by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Filter<E>> {
        self.filters.iter().find(|(k, _)| k == id).map(|(_, f)| f)
    }

    /// Returns true if the group defines `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterates `(id, filter)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter<E>)> {
        self.filters.iter().map(|(k, f)| (k.as_str(), f))
    }

    /// Filter ids in insertion order.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|(k, _)| k.as_str())
    }

    /// Number of filters.
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

impl<E> Default for FilterGroup<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for FilterGroup<E> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<E> fmt::Debug for FilterGroup<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.filter_ids()).finish()
    }
}

impl<E, S: Into<String>> FromIterator<(S, Filter<E>)> for FilterGroup<E> {
    fn from_iter<T: IntoIterator<Item = (S, Filter<E>)>>(iter: T) -> Self {
        let mut group = Self::new();
        for (id, filter) in iter {
            group.insert(id, filter);
        }
        group
    }
}
