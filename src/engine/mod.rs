//! Matching engine.
//!
//! Pure functions over (registry, selections, entity load). Selections
//! within a group combine with OR; groups combine with AND; a group with
//! nothing selected imposes no constraint. There is no hidden state: the
//! same inputs always produce the same outputs.

use std::collections::BTreeMap;

use crate::filter::{Filter, FilterGroup};
use crate::registry::FilterGroupRegistry;
use crate::selection::SelectionSet;
use crate::source::EntityLoad;
use crate::state::{FilterGroupState, FilterState, ReadyState};

/// Selected predicates of one group; an entity passes if any of them holds.
struct GroupConstraint<'a, E> {
    any_of: Vec<&'a Filter<E>>,
}

impl<E> GroupConstraint<'_, E> {
    fn holds(&self, entity: &E) -> bool {
        self.any_of.iter().any(|f| f.matches(entity))
    }
}

fn selected_filters<'a, E>(
    group_id: &str,
    group: &'a FilterGroup<E>,
    selections: &SelectionSet,
) -> Vec<&'a Filter<E>> {
    group
        .iter()
        .filter(|(filter_id, _)| selections.contains(group_id, filter_id))
        .map(|(_, filter)| filter)
        .collect()
}

fn constraints<'a, E>(
    registry: &'a FilterGroupRegistry<E>,
    selections: &SelectionSet,
    exclude_group_id: Option<&str>,
) -> Vec<GroupConstraint<'a, E>> {
    registry
        .iter()
        .filter(|(group_id, _)| Some(*group_id) != exclude_group_id)
        .filter_map(|(group_id, group)| {
            let any_of = selected_filters(group_id, group, selections);
            // Nothing selected: the group never excludes entities.
            (!any_of.is_empty()).then_some(GroupConstraint { any_of })
        })
        .collect()
}

/// Positions of entities passing every non-excluded group's selections.
pub(crate) fn matching_positions<E>(
    registry: &FilterGroupRegistry<E>,
    selections: &SelectionSet,
    entities: &[E],
    exclude_group_id: Option<&str>,
) -> Vec<usize> {
    let constraints = constraints(registry, selections, exclude_group_id);
    entities
        .iter()
        .enumerate()
        .filter(|(_, entity)| constraints.iter().all(|c| c.holds(entity)))
        .map(|(pos, _)| pos)
        .collect()
}

/// Entities satisfying the combined selections, in source order.
///
/// When `exclude_group_id` is set, that group's selections are ignored.
/// Returns an empty list while entities are absent.
#[must_use]
pub fn compute_matching_entities<'a, E>(
    registry: &FilterGroupRegistry<E>,
    selections: &SelectionSet,
    entities: Option<&'a [E]>,
    exclude_group_id: Option<&str>,
) -> Vec<&'a E> {
    let Some(entities) = entities else {
        return Vec::new();
    };
    matching_positions(registry, selections, entities, exclude_group_id)
        .into_iter()
        .map(|pos| &entities[pos])
        .collect()
}

fn ready_state<E>(
    group_id: &str,
    group: &FilterGroup<E>,
    registry: &FilterGroupRegistry<E>,
    selections: &SelectionSet,
    entities: &[E],
) -> ReadyState {
    let context = compute_matching_entities(registry, selections, Some(entities), Some(group_id));
    let filters = group
        .iter()
        .map(|(filter_id, filter)| FilterState {
            filter_id: filter_id.to_string(),
            is_selected: selections.contains(group_id, filter_id),
            match_count: context.iter().filter(|e| filter.matches(e)).count(),
        })
        .collect();
    ReadyState::new(filters)
}

/// State of every registered group.
///
/// A failed load puts every group in `Error`; a pending load puts every
/// group in `Loading`. Otherwise each filter's count is taken against the
/// entities passing all *other* groups' selections.
#[must_use]
pub fn compute_group_states<E>(
    registry: &FilterGroupRegistry<E>,
    selections: &SelectionSet,
    load: &EntityLoad<E>,
) -> BTreeMap<String, FilterGroupState> {
    registry
        .iter()
        .map(|(group_id, group)| {
            let state = match load {
                EntityLoad::Failed(err) => FilterGroupState::Error(err.clone()),
                EntityLoad::Pending => FilterGroupState::Loading,
                EntityLoad::Loaded(entities) => FilterGroupState::Ready(ready_state(
                    group_id, group, registry, selections, entities,
                )),
            };
            (group_id.to_string(), state)
        })
        .collect()
}
