//! # kyrofacet - Faceted filter state for entity collections
//!
//! kyrofacet keeps a shared, multi-group filter state over a collection of
//! entities. After every registration, selection change or entity-load
//! transition it recomputes which entities match and how many entities each
//! filter would match, ready to be rendered as counts next to each option.
//!
//! ## Core Concepts
//!
//! - **Filter**: a named pure predicate over an entity
//! - **FilterGroup**: a named set of filters; selections within a group combine with OR
//! - **SelectionSet**: the selected `(group, filter)` pairs; groups combine with AND
//! - **Match count**: entities satisfying a filter among those passing every *other*
//!   group's selections
//! - **AggregateStateStore**: owns the inputs and the derived state, recomputed on every change
//!
//! ## Usage
//!
//! ```rust
//! use kyrofacet::{AggregateStateStore, FilterGroup};
//!
//! struct Item { id: u32, tag: &'static str }
//!
//! let mut store = AggregateStateStore::new();
//! store.register("tag", FilterGroup::new().with_predicate("a", |i: &Item| i.tag == "a"));
//! store.register("id", FilterGroup::new().with_predicate("gt1", |i: &Item| i.id > 1));
//! store.complete_load(Ok(vec![
//!     Item { id: 1, tag: "a" },
//!     Item { id: 2, tag: "b" },
//!     Item { id: 3, tag: "a" },
//! ]));
//!
//! store.set_group_selected_filters("id", ["gt1"]);
//! let tag = store.group_state("tag").unwrap().as_ready().unwrap();
//! assert_eq!(tag.match_count("a"), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod config;
pub mod error;
pub mod filter;
pub mod registry;
pub mod selection;
pub mod source;
pub mod state;

// Matching and state
pub mod engine;
pub mod store;
pub mod watch;

// Re-export primary types at crate root for convenience
pub use config::{ReplacePolicy, StoreConfig, UnregisterPolicy};
pub use engine::{compute_group_states, compute_matching_entities};
pub use error::{ConfigError, EntityLoadError, FacetError, FacetResult};
pub use filter::{Filter, FilterGroup};
pub use registry::FilterGroupRegistry;
pub use selection::{ParseSelectionKeyError, SelectionKey, SelectionSet};
pub use source::{EntityLoad, EntitySource, LoadStatus};
pub use state::{AggregateSnapshot, FilterGroupState, FilterState, ReadyState};
pub use store::AggregateStateStore;
pub use watch::{ChangeCause, StateChange, StateWatcher, WatcherId};
