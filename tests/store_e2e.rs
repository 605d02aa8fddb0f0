use kyrofacet::{
    compute_matching_entities, AggregateStateStore, EntityLoadError, Filter, FilterGroup,
    FilterGroupState,
};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u32,
    tag: &'static str,
}

fn items() -> Vec<Item> {
    vec![
        Item { id: 1, tag: "a" },
        Item { id: 2, tag: "b" },
        Item { id: 3, tag: "a" },
    ]
}

fn ids(store: &AggregateStateStore<Item>) -> Vec<u32> {
    store.matching_entities().iter().map(|i| i.id).collect()
}

fn scenario_store() -> AggregateStateStore<Item> {
    let mut store = AggregateStateStore::new();
    store.register("G1", FilterGroup::new().with_predicate("f1", |i: &Item| i.tag == "a"));
    store.register("G2", FilterGroup::new().with_predicate("f2", |i: &Item| i.id > 1));
    store.complete_load(Ok(items()));
    store
}

#[test]
fn three_entity_scenario() {
    let mut store = scenario_store();
    assert_eq!(ids(&store), vec![1, 2, 3]);

    store.set_group_selected_filters("G1", ["f1"]);
    assert_eq!(ids(&store), vec![1, 3]);

    store.set_group_selected_filters("G2", ["f2"]);
    assert_eq!(ids(&store), vec![3]);

    // Only G2/f2 selected: G1's counts see {2,b},{3,a}; f1 matches one of them.
    store.set_group_selected_filters("G1", Vec::<String>::new());
    let g1 = store.group_state("G1").unwrap().as_ready().unwrap();
    assert_eq!(g1.match_count("f1"), Some(1));
    assert_eq!(g1.is_selected("f1"), Some(false));
}

#[test]
fn match_counts_exclude_own_group() {
    let mut store = scenario_store();
    store.set_group_selected_filters("G1", ["f1"]);
    store.set_group_selected_filters("G2", ["f2"]);

    let registry = store.registry();
    let selections = store.selections();
    let entities = store.entities().unwrap();

    for (group_id, group) in registry.iter() {
        let context = compute_matching_entities(registry, selections, Some(entities), Some(group_id));
        let ready = store.group_state(group_id).unwrap().as_ready().unwrap();
        for (filter_id, filter) in group.iter() {
            let expected = context.iter().filter(|e| filter.matches(e)).count();
            assert_eq!(ready.match_count(filter_id), Some(expected), "{group_id}.{filter_id}");
        }
    }

    // Globally only {3,a} matches, yet G1's f1 still counts against G2's context.
    assert_eq!(store.matching_count(), 1);
    let g1 = store.group_state("G1").unwrap().as_ready().unwrap();
    assert_eq!(g1.match_count("f1"), Some(1));
    let g2 = store.group_state("G2").unwrap().as_ready().unwrap();
    assert_eq!(g2.match_count("f2"), Some(1));
}

#[test]
fn or_within_group_and_across_groups() {
    let entities: Vec<Item> = (1..=6)
        .map(|id| Item {
            id,
            tag: if id % 2 == 0 { "even" } else { "odd" },
        })
        .collect();

    let mut store = AggregateStateStore::new();
    store.register(
        "A",
        FilterGroup::new()
            .with_predicate("a1", |i: &Item| i.id <= 2)
            .with_predicate("a2", |i: &Item| i.id >= 5),
    );
    store.register("B", FilterGroup::new().with_predicate("b1", |i: &Item| i.tag == "even"));
    store.complete_load(Ok(entities.clone()));

    store.set_group_selected_filters("A", ["a1", "a2"]);
    store.set_group_selected_filters("B", ["b1"]);

    let expected: Vec<u32> = entities
        .iter()
        .filter(|i| (i.id <= 2 || i.id >= 5) && i.tag == "even")
        .map(|i| i.id)
        .collect();
    assert_eq!(ids(&store), expected);
    assert_eq!(expected, vec![2, 6]);
}

#[test]
fn stale_selection_survives_reregistration_without_panicking() {
    let mut store = scenario_store();
    store.register("g", FilterGroup::new().with_predicate("x", |i: &Item| i.id == 1));
    store.set_group_selected_filters("g", ["x"]);
    assert_eq!(ids(&store), vec![1]);

    store.unregister("g");
    store.register("g", FilterGroup::new().with_predicate("y", |i: &Item| i.id == 2));

    let ready = store.group_state("g").unwrap().as_ready().unwrap();
    assert!(ready.get("x").is_none());
    assert_eq!(ready.match_count("y"), Some(1));
    assert_eq!(ready.is_selected("y"), Some(false));
    // The retained "x" key matches nothing in the new definition, so "g" imposes no constraint.
    assert_eq!(ids(&store), vec![1, 2, 3]);
    assert_eq!(store.selected_filter_ids("g"), vec!["x"]);
}

#[test]
fn unknown_filter_ids_wait_for_their_filter() {
    let mut store = scenario_store();
    store.set_group_selected_filters("G1", ["later"]);
    assert_eq!(ids(&store), vec![1, 2, 3]);

    store.register(
        "G1",
        FilterGroup::new()
            .with_predicate("f1", |i: &Item| i.tag == "a")
            .with_filter("later", Filter::new(|i: &Item| i.tag == "b")),
    );
    assert_eq!(ids(&store), vec![2]);
}

#[test]
fn error_dominates_every_group() {
    let mut store = AggregateStateStore::new();
    store.register("G1", FilterGroup::new().with_predicate("f1", |i: &Item| i.tag == "a"));
    store.set_group_selected_filters("G1", ["f1"]);

    store.complete_load(Err(EntityLoadError::new("service unavailable")));

    // Groups registered after the failure are in the error state too.
    store.register("G2", FilterGroup::new().with_predicate("f2", |i: &Item| i.id > 1));
    store.set_group_selected_filters("G2", ["f2"]);

    assert_eq!(store.group_states().len(), 2);
    for state in store.group_states().values() {
        match state {
            FilterGroupState::Error(err) => assert_eq!(err.message(), "service unavailable"),
            other => panic!("expected error state, got {other:?}"),
        }
    }
    assert!(store.matching_entities().is_empty());
}

#[test]
fn state_keys_track_registry_keys() {
    let mut store = scenario_store();
    store.register("G3", FilterGroup::new());
    store.unregister("G1");

    let state_keys: Vec<_> = store.group_states().keys().map(String::as_str).collect();
    let registry_keys: Vec<_> = store.registry().group_ids().collect();
    assert_eq!(state_keys, registry_keys);
    assert_eq!(state_keys, vec!["G2", "G3"]);

    let g3 = store.group_state("G3").unwrap().as_ready().unwrap();
    assert!(g3.is_empty());
}

#[test]
fn context_filters_capture_explicit_context() {
    #[derive(Debug)]
    struct Repo {
        owner: &'static str,
    }

    let mut store = AggregateStateStore::new();
    store.register(
        "owner",
        FilterGroup::new()
            .with_filter("mine", Filter::with_context("alice", |me: &&str, r: &Repo| r.owner == *me)),
    );
    store.complete_load(Ok(vec![Repo { owner: "alice" }, Repo { owner: "bob" }]));
    store.set_group_selected_filters("owner", ["mine"]);

    assert_eq!(store.matching_count(), 1);
    assert_eq!(store.matching_entities()[0].owner, "alice");
}

#[test]
fn snapshot_serializes_for_consumers() {
    #[derive(Debug, Clone, serde::Serialize)]
    struct Row {
        id: u32,
    }

    let mut store = AggregateStateStore::new();
    store.register("big", FilterGroup::new().with_predicate("yes", |r: &Row| r.id > 1));
    store.complete_load(Ok(vec![Row { id: 1 }, Row { id: 2 }]));
    store.set_group_selected_filters("big", ["yes"]);

    let json = serde_json::to_value(store.snapshot()).unwrap();
    assert_eq!(json["matching"], serde_json::json!([{ "id": 2 }]));
    assert_eq!(json["groups"]["big"]["status"], "ready");
    assert_eq!(json["groups"]["big"]["detail"][0]["is_selected"], true);
    assert_eq!(json["revision"], store.revision());
}
