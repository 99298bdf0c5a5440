use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::json;
use slate_core::*;

use crate::*;

fn ui_store() -> Store {
    register(Store::builder()).build()
}

fn branch(store: &Store) -> Rc<UiStateBranch> {
    store
        .get_state()
        .slice::<UiStateBranch>(DEFAULT_BRANCH_KEY)
        .expect("ui state branch registered")
}

/// Renders to the props it was given, for inspection.
fn echo() -> Component<Props> {
    component(|props: &Props| props.clone())
}

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Records into the calling thread's buffer so parallel tests stay apart.
struct CaptureLogs;

impl log::Log for CaptureLogs {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|c| {
            c.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static CAPTURE_LOGS: CaptureLogs = CaptureLogs;

fn capture_logs() {
    // Only the first call installs; later ones find it already set.
    let _ = log::set_logger(&CAPTURE_LOGS);
    log::set_max_level(log::LevelFilter::Trace);
    CAPTURED.with(|c| c.borrow_mut().clear());
}

/// Drains warnings logged on this thread since the last call.
fn take_warnings() -> Vec<String> {
    CAPTURED.with(|c| {
        c.borrow_mut()
            .drain(..)
            .filter(|(level, _)| *level == log::Level::Warn)
            .map(|(_, msg)| msg)
            .collect()
    })
}

fn count_of(props: &Props) -> Option<i64> {
    ui_state_of(props).and_then(|s| s.get_as::<i64>("count"))
}

#[test]
fn test_reduce_from_nothing_is_empty() {
    let b = reduce(None, &"unrelated");
    assert!(b.components.is_empty());

    let store = ui_store();
    assert!(branch(&store).is_empty());
}

#[test]
fn test_reduce_unrelated_action_keeps_identity() {
    let b = reduce(None, &UiStateAction::set("a", ui_state!({ "x": 1 })));
    let same = reduce(Some(&b), &42u8);
    assert!(Rc::ptr_eq(&b, &same));
}

#[test]
fn test_merge_is_shallow_and_keeps_other_entries() {
    let b = reduce(None, &UiStateAction::set("a", ui_state!({ "x": 1, "y": { "deep": true } })));
    let b = reduce(Some(&b), &UiStateAction::set("b", ui_state!({ "z": 0 })));
    let untouched = b.get("b").cloned().expect("b");

    let next = reduce(Some(&b), &UiStateAction::set("a", ui_state!({ "y": { "other": 2 }, "w": 3 })));

    assert_eq!(
        **next.get("a").expect("a"),
        ui_state!({ "x": 1, "y": { "other": 2 }, "w": 3 })
    );
    assert!(Rc::ptr_eq(next.get("b").expect("b"), &untouched));
    // input branch untouched
    assert_eq!(**b.get("a").expect("a"), ui_state!({ "x": 1, "y": { "deep": true } }));
}

#[test]
fn test_seed_applies_only_on_first_write() {
    let seed = Some(ui_state!({ "count": 0, "step": 1 }));
    let b = reduce(
        None,
        &UiStateAction::set_seeded("c", ui_state!({ "count": 5 }), seed.clone()),
    );
    assert_eq!(**b.get("c").expect("c"), ui_state!({ "count": 5, "step": 1 }));

    let b = reduce(Some(&b), &UiStateAction::set("c", ui_state!({ "step": 2 })));
    let b = reduce(
        Some(&b),
        &UiStateAction::set_seeded("c", ui_state!({ "count": 6 }), seed),
    );
    assert_eq!(**b.get("c").expect("c"), ui_state!({ "count": 6, "step": 2 }));
}

#[test]
fn test_release_removes_entry() {
    let b = reduce(None, &UiStateAction::set("gone", ui_state!({ "x": 1 })));
    let b = reduce(Some(&b), &UiStateAction::set("kept", ui_state!({})));
    let b = reduce(Some(&b), &UiStateAction::release("gone"));
    assert!(!b.contains("gone"));
    assert!(b.contains("kept"));

    let again = reduce(Some(&b), &UiStateAction::release("gone"));
    assert!(Rc::ptr_eq(&b, &again));
}

#[test]
fn test_action_encoding() {
    let action = UiStateAction::set("counter-1", ui_state!({ "count": 1 }));
    assert_eq!(
        serde_json::to_value(&action).expect("encode"),
        json!({ "type": "SET_UI_STATE", "payload": { "id": "counter-1", "state": { "count": 1 } } })
    );
    assert_eq!(action.kind(), UiStateAction::SET);

    let decoded: UiStateAction =
        serde_json::from_value(json!({ "type": "RELEASE_UI_STATE", "payload": { "id": "x" } }))
            .expect("decode");
    assert_eq!(decoded, UiStateAction::release("x"));
    assert_eq!(decoded.id(), "x");
}

#[test]
fn test_id_resolution() {
    let keyed = Props::new().with("key", "x");
    let empty = Props::new();

    assert_eq!(UiStateId::from("literal").resolve(&empty).as_deref(), Some("literal"));
    assert_eq!(UiStateId::from_prop("key").resolve(&keyed).as_deref(), Some("x"));
    assert_eq!(UiStateId::from_prop("key").resolve(&empty), None);

    let err = UiStateId::from_prop("key").require(&empty, "Probe");
    assert_eq!(
        err,
        Err(UiStateError::UnresolvedId {
            component: "Probe".into()
        })
    );
    assert!(UiStateId::from("").require(&empty, "Probe").is_err());
}

#[test]
fn test_unresolved_id_fails_read_and_write() {
    let store = ui_store();
    let wrapped = wrap(&store, echo(), UiStateConfig::new(UiStateId::from_prop("key")));
    let instance = wrapped.mount();

    assert!(matches!(
        instance.state_props(&Props::new()),
        Err(UiStateError::UnresolvedId { .. })
    ));
    assert!(matches!(
        instance.dispatch_props(&Props::new()),
        Err(UiStateError::UnresolvedId { .. })
    ));
    assert!(instance.render(&Props::new()).is_err());
    assert_eq!(store.version(), 0);
}

#[test]
fn test_unreachable_branch_is_an_error() {
    // reducer not registered
    let store = Store::builder().build();
    let wrapped = wrap(&store, echo(), UiStateConfig::new("a").name("Orphan"));

    let err = wrapped.mount().render(&Props::new()).expect_err("no branch");
    assert_eq!(
        err,
        UiStateError::BranchUnreachable {
            component: "Orphan".into()
        }
    );
    assert!(err.to_string().contains(DEFAULT_BRANCH_KEY));
}

#[test]
fn test_uninitialized_read_is_none() {
    capture_logs();
    let store = ui_store();
    let instance = wrap(&store, echo(), UiStateConfig::new("fresh")).mount();
    let props = instance.render(&Props::new()).expect("render");

    assert!(props.contains(prop::UI_STATE));
    assert!(ui_state_of(&props).is_none());
    assert!(setter_of(&props).is_some());
    assert!(release_of(&props).is_some());

    let warnings = take_warnings();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("`fresh`"));
    assert!(warnings[0].contains("before it was initialized"));

    setter_of(&props).expect("setter")(ui_state!({ "ready": true }));
    let props = instance.render(&Props::new()).expect("render");
    assert!(ui_state_of(&props).is_some());
    assert_eq!(take_warnings(), Vec::<String>::new());
}

#[test]
fn test_key_isolation() {
    let store = ui_store();
    let a = wrap(&store, echo(), UiStateConfig::new("a")).mount();
    let b = wrap(&store, echo(), UiStateConfig::new("b")).mount();

    let set_b = setter_of(&b.render(&Props::new()).expect("b")).expect("setter");
    set_b(ui_state!({ "count": 7 }));
    let before = b.state_props(&Props::new()).expect("b").ui_state;

    let set_a = setter_of(&a.render(&Props::new()).expect("a")).expect("setter");
    set_a(ui_state!({ "count": 1 }));

    assert_eq!(count_of(&a.render(&Props::new()).expect("a")), Some(1));
    let after = b.state_props(&Props::new()).expect("b").ui_state;
    assert_eq!(after.as_ref().and_then(|s| s.get_as::<i64>("count")), Some(7));
    assert!(Rc::ptr_eq(
        before.as_ref().expect("b before"),
        after.as_ref().expect("b after")
    ));
}

#[test]
fn test_key_sharing() {
    let store = ui_store();
    let shared = wrap(&store, echo(), UiStateConfig::new(UiStateId::from_prop("key")));
    let one = shared.mount();
    let two = shared.mount();
    let props = Props::new().with("key", "shared");

    let set = setter_of(&one.render(&props).expect("one")).expect("setter");
    set(ui_state!({ "count": 3 }));

    assert_eq!(count_of(&two.render(&props).expect("two")), Some(3));
    assert_eq!(branch(&store).len(), 1);
}

#[test]
fn test_same_definition_different_ids() {
    let store = ui_store();
    let row = wrap(&store, echo(), UiStateConfig::new(UiStateId::from_prop("row")));
    let first = row.mount();
    let second = row.mount();
    let p1 = Props::new().with("row", String::from("row-1"));
    let p2 = Props::new().with("row", String::from("row-2"));

    setter_of(&first.render(&p1).expect("first")).expect("setter")(ui_state!({ "count": 1 }));
    setter_of(&second.render(&p2).expect("second")).expect("setter")(ui_state!({ "count": 2 }));

    assert_eq!(count_of(&first.render(&p1).expect("first")), Some(1));
    assert_eq!(count_of(&second.render(&p2).expect("second")), Some(2));
}

#[test]
fn test_setter_keeps_id_from_construction() {
    let store = ui_store();
    let wrapped = wrap(&store, echo(), UiStateConfig::new(UiStateId::from_prop("key")));
    let instance = wrapped.mount();

    let set = instance
        .dispatch_props(&Props::new().with("key", "old"))
        .expect("dispatch props")
        .set_ui_state;
    // props changed since, but the setter still targets "old"
    let _ = instance.render(&Props::new().with("key", "new"));
    set(ui_state!({ "v": 1 }));

    let b = branch(&store);
    assert!(b.contains("old"));
    assert!(!b.contains("new"));
}

#[test]
fn test_initial_state_seeds_first_write() {
    let store = ui_store();
    let wrapped = wrap(
        &store,
        echo(),
        UiStateConfig::new("form").initial_state(ui_state!({ "draft": "", "dirty": false })),
    );
    let instance = wrapped.mount();

    let set = setter_of(&instance.render(&Props::new()).expect("render")).expect("setter");
    set(ui_state!({ "draft": "hi" }));

    let state = ui_state_of(&instance.render(&Props::new()).expect("render")).expect("state");
    assert_eq!(*state, ui_state!({ "draft": "hi", "dirty": false }));
}

#[test]
fn test_release_via_injected_callback() {
    let store = ui_store();
    let instance = wrap(&store, echo(), UiStateConfig::new("temp")).mount();
    let props = instance.render(&Props::new()).expect("render");

    setter_of(&props).expect("setter")(ui_state!({ "x": 1 }));
    assert!(branch(&store).contains("temp"));

    release_of(&props).expect("release")();
    assert!(!branch(&store).contains("temp"));
    assert!(ui_state_of(&instance.render(&Props::new()).expect("render")).is_none());
}

#[derive(Debug)]
struct Tick;

fn ticks(prev: Option<&Rc<u64>>, action: &dyn std::any::Any) -> Rc<u64> {
    let prev = prev.cloned().unwrap_or_default();
    if action.is::<Tick>() {
        Rc::new(*prev + 1)
    } else {
        prev
    }
}

#[test]
fn test_pipeline_memoizes_per_stage() {
    let store = register(Store::builder().slice("ticks", ticks)).build();
    let pipeline = UiStatePipeline::new("a".into(), None, "Probe");
    let props = Props::new();

    store.dispatch(UiStateAction::set("a", ui_state!({ "n": 1 })));
    let first = pipeline.select(&store.get_state(), &props).expect("select");
    let again = pipeline.select(&store.get_state(), &props).expect("select");
    assert!(Rc::ptr_eq(first.as_ref().expect("a"), again.as_ref().expect("a")));
    assert_eq!(
        pipeline.recomputations(),
        Recomputations {
            locator: 1,
            branch: 1,
            components: 1,
            entry: 1
        }
    );

    // nothing handles this: the tree itself is reused
    store.dispatch("unrelated");
    pipeline.select(&store.get_state(), &props).expect("select");
    assert_eq!(pipeline.recomputations().branch, 1);

    // new tree, same branch: only the branch lookup re-runs
    store.dispatch(Tick);
    pipeline.select(&store.get_state(), &props).expect("select");
    let r = pipeline.recomputations();
    assert_eq!((r.locator, r.branch, r.components, r.entry), (1, 2, 1, 1));

    // a write elsewhere re-runs the lookups but keeps the entry identity
    store.dispatch(UiStateAction::set("b", ui_state!({ "n": 2 })));
    let after = pipeline.select(&store.get_state(), &props).expect("select");
    let r = pipeline.recomputations();
    assert_eq!((r.locator, r.branch, r.components, r.entry), (1, 3, 2, 2));
    assert!(Rc::ptr_eq(first.as_ref().expect("a"), after.as_ref().expect("a")));
}

#[test]
fn test_branch_selector_precedence() {
    // only a non-default branch exists
    let store = register_at(Store::builder(), "elsewhere").build();
    let elsewhere = locator_at("elsewhere");
    let missing: BranchLocator = locator(|_| None);

    let plain = wrap(&store, echo(), UiStateConfig::new("a"));
    let configured = wrap(
        &store,
        echo(),
        UiStateConfig::new("a").branch_selector(elsewhere.clone()),
    );

    // default locator finds nothing
    assert!(matches!(
        plain.mount().render(&Props::new()),
        Err(UiStateError::BranchUnreachable { .. })
    ));
    // configured locator beats the default
    assert!(configured.mount().render(&Props::new()).is_ok());
    // a prop beats the default
    assert!(plain
        .mount()
        .render(&Props::new().with(prop::BRANCH_SELECTOR, elsewhere))
        .is_ok());
    // a prop beats the configured locator
    assert!(matches!(
        configured
            .mount()
            .render(&Props::new().with(prop::BRANCH_SELECTOR, missing)),
        Err(UiStateError::BranchUnreachable { .. })
    ));
    // a prop of the wrong type is a configuration error too
    assert!(matches!(
        configured
            .mount()
            .render(&Props::new().with(prop::BRANCH_SELECTOR, "ui_state")),
        Err(UiStateError::Core(CoreError::PropType { .. }))
    ));
}

#[test]
fn test_custom_branch_key() {
    let store = register_at(Store::builder(), "screens").build();
    let wrapped = wrap(
        &store,
        echo(),
        UiStateConfig::new("tab").branch_selector(locator_at("screens")),
    );
    let instance = wrapped.mount();
    setter_of(&instance.render(&Props::new()).expect("render")).expect("setter")(ui_state!({ "i": 2 }));

    let screens = store
        .get_state()
        .slice::<UiStateBranch>("screens")
        .expect("screens");
    assert!(screens.contains("tab"));
    assert!(!store.get_state().contains(DEFAULT_BRANCH_KEY));
}

#[test]
fn test_transform_props_replaces_default_names() {
    let store = ui_store();
    let wrapped = wrap(
        &store,
        echo(),
        UiStateConfig::new("t").transform_props(|state, dispatch, _own| {
            let count = state
                .ui_state
                .as_ref()
                .and_then(|s| s.get_as::<i64>("count"));
            let set = dispatch.set_ui_state.clone();
            let bump: Rc<dyn Fn()> = Rc::new(move || {
                set(ui_state!({ "count": count.unwrap_or(0) + 1 }));
            });
            Props::new().with("value", count).with("bump", bump)
        }),
    );
    let instance = wrapped.mount();
    let own = Props::new().with("label", "clicks");

    let props = instance.render(&own).expect("render");
    let keys: BTreeSet<&str> = props.keys().collect();
    assert_eq!(keys, BTreeSet::from(["bump", "label", "value"]));
    assert_eq!(props.get::<Option<i64>>("value"), Some(&None));

    props.get::<Rc<dyn Fn()>>("bump").expect("bump")();
    let props = instance.render(&own).expect("render");
    assert_eq!(props.get::<Option<i64>>("value"), Some(&Some(1)));

    props.get::<Rc<dyn Fn()>>("bump").expect("bump")();
    let props = instance.render(&own).expect("render");
    assert_eq!(props.get::<Option<i64>>("value"), Some(&Some(2)));
}

#[test]
fn test_transform_own_props_win() {
    let store = ui_store();
    let wrapped = wrap(
        &store,
        echo(),
        UiStateConfig::new("t").transform_props(|_, _, _| Props::new().with("label", "from transform")),
    );
    let props = wrapped
        .mount()
        .render(&Props::new().with("label", "own"))
        .expect("render");
    assert_eq!(props.str("label"), Some("own"));
}

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    id: &'static str,
    count: Option<i64>,
}

fn counter_view(id: &'static str) -> Component<(Frame, Option<SetUiState>)> {
    component(move |props: &Props| {
        let frame = Frame {
            id,
            count: count_of(props),
        };
        (frame, setter_of(props))
    })
}

#[test]
fn test_counter_end_to_end() {
    capture_logs();
    let store = ui_store();
    let dispatched = Rc::new(RefCell::new(Vec::new()));
    store.on_action({
        let dispatched = dispatched.clone();
        move |action, _| {
            if let Some(a) = action.as_any().downcast_ref::<UiStateAction>() {
                dispatched
                    .borrow_mut()
                    .push(serde_json::to_value(a).expect("encode"));
            }
        }
    });

    let counter_1 = wrap(
        &store,
        counter_view("counter-1"),
        UiStateConfig::new("counter-1").initial_state(ui_state!({ "count": 0 })),
    );
    let counter_2 = wrap(
        &store,
        counter_view("counter-2"),
        UiStateConfig::new("counter-2").initial_state(ui_state!({ "count": 0 })),
    )
    .mount();

    let first_frames = Rc::new(RefCell::new(Vec::new()));
    let mut root = Root::new(&store, {
        let first_frames = first_frames.clone();
        move || {
            let (frame, set) = counter_1.render(&Props::new()).expect("counter-1");
            first_frames.borrow_mut().push(frame.clone());
            // mount logic: bootstrap the entry once
            let bootstrap = set.clone();
            disposable_effect((), move || {
                if let Some(set) = bootstrap {
                    set(ui_state!({ "count": 0 }));
                }
                Dispose::noop()
            });
            (frame, set)
        }
    });

    let (frame, _) = root.settle();
    let warnings = take_warnings();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("`counter-1`"));
    assert_eq!(
        *first_frames.borrow(),
        vec![
            Frame { id: "counter-1", count: None },
            Frame { id: "counter-1", count: Some(0) },
        ]
    );
    assert_eq!(frame.count, Some(0));
    let (other, _) = counter_2.render(&Props::new()).expect("counter-2");
    assert_eq!(other.count, None);

    let (_, set) = root.render();
    set.expect("setter")(ui_state!({ "count": 1 }));
    assert!(root.is_dirty());
    let (frame, _) = root.render();
    assert_eq!(frame.count, Some(1));

    let (other, _) = counter_2.render(&Props::new()).expect("counter-2");
    assert_eq!(other.count, None);
    assert!(!branch(&store).contains("counter-2"));

    assert_eq!(
        *dispatched.borrow(),
        vec![
            json!({ "type": "SET_UI_STATE", "payload": { "id": "counter-1", "state": { "count": 0 }, "seed": { "count": 0 } } }),
            json!({ "type": "SET_UI_STATE", "payload": { "id": "counter-1", "state": { "count": 1 }, "seed": { "count": 0 } } }),
        ]
    );
}

#[test]
fn test_composed_rows_share_a_definition() {
    let store = ui_store();
    let row = wrap(
        &store,
        component(|props: &Props| {
            ui_state_of(props)
                .and_then(|s| s.get_as::<bool>("open"))
                .unwrap_or(false)
        }),
        UiStateConfig::new(UiStateId::from_prop("row")),
    );

    let mut root = Root::new(&store, move || {
        ["r1", "r2"]
            .iter()
            .map(|id| row.render(&Props::new().with("row", *id)).expect("row"))
            .collect::<Vec<_>>()
    });
    assert_eq!(root.render(), vec![false, false]);

    store.dispatch(UiStateAction::set("r1", ui_state!({ "open": true })));
    assert_eq!(root.render_if_dirty(), Some(vec![true, false]));
    assert_eq!(root.render_if_dirty(), None);

    store.dispatch(UiStateAction::set("r2", ui_state!({ "open": true })));
    store.dispatch(UiStateAction::release("r1"));
    assert_eq!(root.render_if_dirty(), Some(vec![false, true]));
}

#[test]
fn test_swapped_definitions_at_one_position_stay_apart() {
    let store = ui_store();
    store.dispatch(UiStateAction::set("b", ui_state!({ "who": "b" })));

    let labelled = |label: &'static str| {
        component(move |props: &Props| {
            let who = ui_state_of(props).and_then(|s| s.get_as::<String>("who"));
            (label, who)
        })
    };
    let a = wrap(&store, labelled("A"), UiStateConfig::new("a"));
    let b = wrap(&store, labelled("B"), UiStateConfig::new("b"));

    let show_a = Rc::new(std::cell::Cell::new(true));
    let mut root = Root::new(&store, {
        let show_a = show_a.clone();
        move || {
            let wrapped = if show_a.get() { &a } else { &b };
            wrapped.render(&Props::new()).expect("render")
        }
    });

    assert_eq!(root.render(), ("A", None));
    show_a.set(false);
    assert_eq!(root.render(), ("B", Some("b".to_owned())));
    show_a.set(true);
    assert_eq!(root.render(), ("A", None));
}

#[test]
fn test_ui_state_helpers() {
    assert_eq!(
        to_ui_state(json!([1, 2])),
        Err(UiStateError::NotAnObject { found: "an array" })
    );
    assert_eq!(to_ui_state(json!({ "a": 1 })), Ok(ui_state!({ "a": 1 })));

    #[derive(serde::Serialize)]
    struct Draft {
        text: &'static str,
        len: usize,
    }
    let state = ui_state_from(&Draft { text: "hey", len: 3 }).expect("object");
    assert_eq!(state.get_as::<String>("text").as_deref(), Some("hey"));
    assert_eq!(state.get_as::<usize>("len"), Some(3));
    assert_eq!(state.get_as::<bool>("len"), None);
    assert_eq!(merge(&ui_state!({ "a": 1, "b": 2 }), &ui_state!({ "b": 3 })), ui_state!({ "a": 1, "b": 3 }));
}
