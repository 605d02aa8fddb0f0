//! Selection keys and the flat selection set.
//!
//! A selection is a `(group, filter)` pair. Keys display as the flat string
//! `"group.filter"`, but are stored and serialized structurally so a group
//! whose id is a prefix of another group's id can never claim that group's
//! keys.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of one selected filter within one group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionKey {
    group_id: String,
    filter_id: String,
}

impl SelectionKey {
    /// Separator used by the flat string form.
    pub const SEPARATOR: char = '.';

    /// Creates a key from its parts.
    #[must_use]
    pub fn new(group_id: impl Into<String>, filter_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            filter_id: filter_id.into(),
        }
    }

    /// The group component.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The filter component.
    #[must_use]
    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.group_id, Self::SEPARATOR, self.filter_id)
    }
}

/// Error returned when a flat key has no separator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Selection key '{0}' is missing the '.' separator")]
pub struct ParseSelectionKeyError(String);

impl FromStr for SelectionKey {
    type Err = ParseSelectionKeyError;

    /// Splits at the first separator; the filter id may itself contain dots.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, filter) = s
            .split_once(Self::SEPARATOR)
            .ok_or_else(|| ParseSelectionKeyError(s.to_string()))?;
        Ok(Self::new(group, filter))
    }
}

/// Serialized as a `[group, filter]` pair; the flat form cannot carry a
/// group id containing the separator.
impl Serialize for SelectionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.group_id, &self.filter_id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SelectionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (group_id, filter_id) = <(String, String)>::deserialize(deserializer)?;
        Ok(Self { group_id, filter_id })
    }
}

/// The set of currently selected `(group, filter)` pairs.
///
/// Independent of registry contents: keys may reference groups or filters
/// that are not registered. The matching engine ignores such keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet {
    keys: BTreeSet<SelectionKey>,
}

impl SelectionSet {
    /// Creates an empty selection set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key. Returns true if it was not already present.
    pub fn insert(&mut self, group_id: &str, filter_id: &str) -> bool {
        self.keys.insert(SelectionKey::new(group_id, filter_id))
    }

    /// Removes a key. Returns true if it was present.
    pub fn remove(&mut self, group_id: &str, filter_id: &str) -> bool {
        self.keys.remove(&SelectionKey::new(group_id, filter_id))
    }

    /// Returns true if `filter_id` is selected within `group_id`.
    #[must_use]
    pub fn contains(&self, group_id: &str, filter_id: &str) -> bool {
        self.keys.contains(&SelectionKey::new(group_id, filter_id))
    }

    /// Removes every key belonging to `group_id`, returning how many were removed.
    pub fn remove_group(&mut self, group_id: &str) -> usize {
        let before = self.keys.len();
        self.keys.retain(|k| k.group_id != group_id);
        before - self.keys.len()
    }

    /// Replaces the whole selection of `group_id` with `filter_ids`.
    ///
    /// Duplicates collapse. Ids need not exist in the registered group.
    pub fn replace_group<I, S>(&mut self, group_id: &str, filter_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove_group(group_id);
        self.extend_group(group_id, filter_ids);
    }

    /// Adds `filter_ids` to `group_id` without touching existing keys.
    pub fn extend_group<I, S>(&mut self, group_id: &str, filter_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in filter_ids {
            self.insert(group_id, id.as_ref());
        }
    }

    /// Flips a key, returning the new selected flag.
    pub fn toggle(&mut self, group_id: &str, filter_id: &str) -> bool {
        if self.remove(group_id, filter_id) {
            false
        } else {
            self.insert(group_id, filter_id)
        }
    }

    /// Filter ids selected within `group_id`, sorted.
    pub fn selected_in<'s>(&'s self, group_id: &str) -> impl Iterator<Item = &'s str> + 's {
        let group_id = group_id.to_owned();
        self.keys
            .iter()
            .filter(move |k| k.group_id == group_id)
            .map(|k| k.filter_id.as_str())
    }

    /// Returns true if any key belongs to `group_id`.
    #[must_use]
    pub fn has_group(&self, group_id: &str) -> bool {
        self.keys.iter().any(|k| k.group_id == group_id)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates all keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectionKey> {
        self.keys.iter()
    }
}

impl FromIterator<SelectionKey> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = SelectionKey>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
