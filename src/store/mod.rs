//! Aggregate state store.
//!
//! The store owns the registry, the selection set and the entity load, and
//! holds the state derived from them. Every mutation recomputes the derived
//! state synchronously from scratch, so there is never a stale read between
//! a mutation and its effect.

mod load;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use crate::config::{ReplacePolicy, StoreConfig, UnregisterPolicy};
use crate::engine::{compute_group_states, matching_positions};
use crate::error::{EntityLoadError, FacetError, FacetResult};
use crate::filter::FilterGroup;
use crate::registry::FilterGroupRegistry;
use crate::selection::SelectionSet;
use crate::source::{EntityLoad, EntitySource, LoadStatus};
use crate::state::{AggregateSnapshot, FilterGroupState};
use crate::watch::{ChangeCause, StateChange, StateWatcher, WatchHub};

use load::{LoadPoll, LoadTask};

/// Owner of the shared filter state of one session.
///
/// Create one per session and hand it to consumers explicitly. Mutations
/// take `&mut self`; readers get borrowed views or owned snapshots.
///
/// ```
/// use kyrofacet::{AggregateStateStore, FilterGroup};
///
/// #[derive(Clone)]
/// struct Repo { name: &'static str, starred: bool, archived: bool }
///
/// let mut store = AggregateStateStore::new();
/// store.register(
///     "flags",
///     FilterGroup::new()
///         .with_predicate("starred", |r: &Repo| r.starred)
///         .with_predicate("archived", |r: &Repo| r.archived),
/// );
/// store.complete_load(Ok(vec![
///     Repo { name: "kyro", starred: true, archived: false },
///     Repo { name: "old", starred: false, archived: true },
/// ]));
///
/// store.set_group_selected_filters("flags", ["starred"]);
/// let names: Vec<_> = store.matching_entities().iter().map(|r| r.name).collect();
/// assert_eq!(names, ["kyro"]);
///
/// let flags = store.group_state("flags").unwrap().as_ready().unwrap();
/// assert_eq!(flags.match_count("archived"), Some(1));
/// ```
pub struct AggregateStateStore<E> {
    config: StoreConfig,
    registry: FilterGroupRegistry<E>,
    selections: SelectionSet,
    load: EntityLoad<E>,
    in_flight: Option<LoadTask<E>>,
    groups: BTreeMap<String, FilterGroupState>,
    matching: Vec<usize>,
    revision: u64,
    computed_at: DateTime<Utc>,
    hub: WatchHub,
}

impl<E> AggregateStateStore<E> {
    /// Creates a store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a store with the given configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            registry: FilterGroupRegistry::new(),
            selections: SelectionSet::new(),
            load: EntityLoad::Pending,
            in_flight: None,
            groups: BTreeMap::new(),
            matching: Vec::new(),
            revision: 0,
            computed_at: Utc::now(),
            hub: WatchHub::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Registers (or replaces) a group with no initial selection.
    pub fn register(
        &mut self,
        group_id: impl Into<String>,
        group: impl Into<Arc<FilterGroup<E>>>,
    ) {
        self.register_with_selection(group_id, group, std::iter::empty::<&str>());
    }

    /// Registers (or replaces) a group and merges `initial_filter_ids` into
    /// its selection.
    ///
    /// The merge is additive. Whether a replaced group's earlier keys
    /// survive is governed by [`ReplacePolicy`].
    pub fn register_with_selection<I, S>(
        &mut self,
        group_id: impl Into<String>,
        group: impl Into<Arc<FilterGroup<E>>>,
        initial_filter_ids: I,
    ) where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group_id = group_id.into();
        let replaced = self.registry.register(group_id.clone(), group).is_some();

        if replaced && self.config.replace_policy == ReplacePolicy::ClearSelections {
            let cleared = self.selections.remove_group(&group_id);
            debug!(group_id = %group_id, cleared, "cleared selections of replaced group");
        }
        self.selections.extend_group(&group_id, initial_filter_ids);

        debug!(group_id = %group_id, replaced, "registered filter group");
        self.recompute(ChangeCause::Registered { group_id });
    }

    /// Unregisters a group. Returns false (and changes nothing) for unknown ids.
    ///
    /// Under [`UnregisterPolicy::RetainSelections`] the group's keys stay in
    /// the selection set and apply again if the id is re-registered.
    pub fn unregister(&mut self, group_id: &str) -> bool {
        if self.registry.unregister(group_id).is_none() {
            trace!(group_id, "unregister of unknown group ignored");
            return false;
        }

        if self.config.unregister_policy == UnregisterPolicy::PruneSelections {
            let pruned = self.selections.remove_group(group_id);
            debug!(group_id, pruned, "pruned selections of unregistered group");
        }

        debug!(group_id, "unregistered filter group");
        self.recompute(ChangeCause::Unregistered {
            group_id: group_id.to_string(),
        });
        true
    }

    /// The registered groups.
    #[must_use]
    pub const fn registry(&self) -> &FilterGroupRegistry<E> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Selections
    // ------------------------------------------------------------------

    /// Replaces the whole selection of `group_id`.
    ///
    /// Ids need not exist in the group (or the group need not be
    /// registered); unknown ids are stored and ignored until they match.
    pub fn set_group_selected_filters<I, S>(&mut self, group_id: &str, filter_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.selections.replace_group(group_id, filter_ids);
        debug!(
            group_id,
            selected = self.selections.selected_in(group_id).count(),
            "replaced group selection"
        );
        self.recompute(ChangeCause::SelectionChanged {
            group_id: group_id.to_string(),
        });
    }

    /// Flips one filter's selection and returns its new selected flag.
    pub fn toggle_filter(&mut self, group_id: &str, filter_id: &str) -> bool {
        let selected = self.selections.toggle(group_id, filter_id);
        debug!(group_id, filter_id, selected, "toggled filter");
        self.recompute(ChangeCause::SelectionChanged {
            group_id: group_id.to_string(),
        });
        selected
    }

    /// Clears the selection of every group, registered or not.
    pub fn clear_selections(&mut self) {
        let cleared = self.selections.len();
        self.selections.clear();
        debug!(cleared, "cleared all selections");
        self.recompute(ChangeCause::SelectionsCleared);
    }

    /// Filter ids currently selected in `group_id`, sorted. Includes ids
    /// the registered group does not define.
    #[must_use]
    pub fn selected_filter_ids(&self, group_id: &str) -> Vec<&str> {
        self.selections.selected_in(group_id).collect()
    }

    /// The full selection set.
    #[must_use]
    pub const fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    // ------------------------------------------------------------------
    // Entity loading
    // ------------------------------------------------------------------

    /// Runs `source` once on a loader thread.
    ///
    /// The outcome is applied by [`poll_load`](Self::poll_load) or
    /// [`wait_for_load`](Self::wait_for_load). Entities from an earlier
    /// load stay visible until the new outcome arrives.
    ///
    /// # Errors
    /// - `LoadInFlight`: a previous load has not been applied yet
    /// - `Internal`: the loader thread could not be spawned
    pub fn start_load<S>(&mut self, source: S) -> FacetResult<()>
    where
        S: EntitySource<E> + 'static,
        E: Send + 'static,
    {
        if self.in_flight.is_some() {
            return Err(FacetError::LoadInFlight);
        }
        self.in_flight = Some(LoadTask::spawn(source)?);
        debug!("entity load started");
        Ok(())
    }

    /// Returns true while a started load has not been applied.
    #[must_use]
    pub const fn is_load_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies the in-flight load's outcome if it has arrived.
    ///
    /// Returns true if an outcome was applied.
    pub fn poll_load(&mut self) -> bool {
        let Some(task) = &self.in_flight else {
            return false;
        };
        match task.poll() {
            LoadPoll::Waiting => false,
            LoadPoll::Done(outcome) => {
                self.in_flight = None;
                self.complete_load(outcome);
                true
            }
        }
    }

    /// Blocks until the in-flight load's outcome arrives, then applies it.
    ///
    /// Returns the current status immediately when nothing is in flight. A
    /// failed load is not an error here: it is reported as
    /// [`LoadStatus::Failed`] and carried by every group's state.
    ///
    /// # Errors
    /// - `Timeout`: no outcome within `timeout`; the load stays in flight
    pub fn wait_for_load(&mut self, timeout: Duration) -> FacetResult<LoadStatus> {
        let Some(task) = &self.in_flight else {
            return Ok(self.load.status());
        };
        let outcome = task.wait(timeout)?;
        self.in_flight = None;
        self.complete_load(outcome);
        Ok(self.load.status())
    }

    /// Applies a load outcome obtained by the caller.
    ///
    /// A failure replaces any earlier entities and puts every group in the
    /// error state; a later success recovers.
    pub fn complete_load(&mut self, outcome: Result<Vec<E>, EntityLoadError>) {
        let cause = match &outcome {
            Ok(entities) => {
                info!(entity_count = entities.len(), "entities loaded");
                ChangeCause::EntitiesLoaded {
                    entity_count: entities.len(),
                }
            }
            Err(err) => {
                warn!(error = %err, "entity load failed");
                ChangeCause::EntityLoadFailed {
                    message: err.message().to_string(),
                }
            }
        };
        self.load = outcome.into();
        self.recompute(cause);
    }

    /// Summary of the entity load.
    #[must_use]
    pub fn load_status(&self) -> LoadStatus {
        self.load.status()
    }

    /// All loaded entities, in source order.
    #[must_use]
    pub fn entities(&self) -> Option<&[E]> {
        self.load.entities()
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// State of one registered group.
    #[must_use]
    pub fn group_state(&self, group_id: &str) -> Option<&FilterGroupState> {
        self.groups.get(group_id)
    }

    /// State of every registered group.
    #[must_use]
    pub const fn group_states(&self) -> &BTreeMap<String, FilterGroupState> {
        &self.groups
    }

    /// Entities matching every group's selections, in source order.
    #[must_use]
    pub fn matching_entities(&self) -> Vec<&E> {
        let Some(entities) = self.load.entities() else {
            return Vec::new();
        };
        self.matching.iter().map(|&pos| &entities[pos]).collect()
    }

    /// Number of matching entities.
    #[must_use]
    pub fn matching_count(&self) -> usize {
        self.matching.len()
    }

    /// Revision of the derived state; bumped on every recomputation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// When the derived state was last recomputed.
    #[must_use]
    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Owned copy of the derived state.
    #[must_use]
    pub fn snapshot(&self) -> AggregateSnapshot<E>
    where
        E: Clone,
    {
        AggregateSnapshot {
            revision: self.revision,
            computed_at: self.computed_at,
            groups: self.groups.clone(),
            matching: self.matching_entities().into_iter().cloned().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Change feed
    // ------------------------------------------------------------------

    /// Subscribes to state changes.
    pub fn watch(&mut self) -> StateWatcher {
        self.hub.subscribe(self.config.watcher_capacity)
    }

    /// Number of live watchers as of the last change.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.hub.len()
    }

    /// Change events dropped because a watcher fell behind.
    #[must_use]
    pub const fn dropped_changes(&self) -> u64 {
        self.hub.dropped()
    }

    fn recompute(&mut self, cause: ChangeCause) {
        let started = Instant::now();

        self.groups = compute_group_states(&self.registry, &self.selections, &self.load);
        self.matching = match self.load.entities() {
            Some(entities) => matching_positions(&self.registry, &self.selections, entities, None),
            None => Vec::new(),
        };
        self.revision += 1;
        self.computed_at = Utc::now();

        trace!(
            revision = self.revision,
            groups = self.groups.len(),
            matching = self.matching.len(),
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "recomputed aggregate state"
        );

        self.hub.publish(&StateChange {
            revision: self.revision,
            cause,
            at: self.computed_at,
        });
    }
}

impl<E> Default for AggregateStateStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for AggregateStateStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateStateStore")
            .field("revision", &self.revision)
            .field("groups", &self.registry.len())
            .field("selections", &self.selections.len())
            .field("load", &self.load.status())
            .field("matching", &self.matching.len())
            .finish_non_exhaustive()
    }
}
