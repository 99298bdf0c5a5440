use std::rc::Rc;

use slate_core::prelude::*;
use slate_devtools::Inspector;
use slate_ui_state::*;

type Click = Rc<dyn Fn()>;

struct Counter {
    label: String,
    count: Option<i64>,
    increment: Click,
    reset: Click,
}

fn counter_view() -> Component<Counter> {
    component(|props: &Props| Counter {
        label: props.str("counter_id").unwrap_or("?").to_owned(),
        count: props.get::<Option<i64>>("count").copied().flatten(),
        increment: props
            .get::<Click>("increment")
            .cloned()
            .unwrap_or_else(|| Rc::new(|| {})),
        reset: props
            .get::<Click>("reset")
            .cloned()
            .unwrap_or_else(|| Rc::new(|| {})),
    })
}

fn counters(store: &Store) -> WrappedComponent<Counter> {
    wrap(
        store,
        counter_view(),
        UiStateConfig::new(UiStateId::from_prop("counter_id"))
            .name("Counter")
            .initial_state(ui_state!({ "count": 0 }))
            .transform_props(|state, dispatch, _own| {
                let count = state.ui_state.as_ref().and_then(|s| s.get_as::<i64>("count"));
                let next = count.unwrap_or(0) + 1;
                let set = dispatch.set_ui_state.clone();
                let increment: Click = Rc::new(move || set(ui_state!({ "count": next })));
                let set = dispatch.set_ui_state.clone();
                let reset: Click = Rc::new(move || set(ui_state!({ "count": 0 })));
                Props::new()
                    .with("count", count)
                    .with("increment", increment)
                    .with("reset", reset)
            }),
    )
}

fn print_frame(frame: &[Counter]) {
    let line: Vec<String> = frame
        .iter()
        .map(|c| match c.count {
            Some(n) => format!("{}={n}", c.label),
            None => format!("{}=-", c.label),
        })
        .collect();
    println!("{}", line.join("  "));
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = register(Store::builder()).build();
    let inspector = Inspector::attach(&store);
    let counter = counters(&store);

    let mut root = Root::new(&store, move || {
        ["left", "right"]
            .into_iter()
            .map(|id| {
                let frame = counter.render(&Props::new().with("counter_id", id))?;
                // first write per counter happens on mount
                let bootstrap = frame.reset.clone();
                disposable_effect(id, move || {
                    bootstrap();
                    Dispose::noop()
                });
                Ok(frame)
            })
            .collect::<Result<Vec<_>, UiStateError>>()
    });

    let frame = root.settle()?;
    print_frame(&frame);

    for target in [0, 0, 1] {
        let frame = root.render()?;
        (frame[target].increment)();
        if let Some(frame) = root.render_if_dirty() {
            print_frame(&frame?);
        }
    }

    log::info!("{} actions recorded", inspector.history().len());
    for entry in inspector.history() {
        println!("#{} {}", entry.seq, entry.action);
    }
    println!("{}", serde_json::to_string_pretty(&inspector.dump())?);
    Ok(())
}
