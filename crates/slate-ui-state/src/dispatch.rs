use std::rc::Rc;

use slate_core::{Props, Store};

use crate::action::UiStateAction;
use crate::branch::UiState;
use crate::error::UiStateError;
use crate::id::UiStateId;

/// Merges a partial state into the bound instance's entry.
pub type SetUiState = Rc<dyn Fn(UiState)>;

/// Drops the bound instance's entry.
pub type ReleaseUiState = Rc<dyn Fn()>;

/// Builds a setter bound to the id resolved from `props` right now.
///
/// The id is not re-resolved per call: if the props an id is derived from
/// change, a setter built from the old props keeps writing to the old key.
pub fn bind_setter(
    store: &Store,
    id: &UiStateId,
    props: &Props,
    seed: Option<Rc<UiState>>,
    component: &str,
) -> Result<SetUiState, UiStateError> {
    let id = id.require(props, component)?;
    let store = store.clone();
    Ok(Rc::new(move |partial: UiState| {
        store.dispatch(UiStateAction::set_seeded(
            id.clone(),
            partial,
            seed.as_deref().cloned(),
        ));
    }))
}

pub fn bind_release(
    store: &Store,
    id: &UiStateId,
    props: &Props,
    component: &str,
) -> Result<ReleaseUiState, UiStateError> {
    let id = id.require(props, component)?;
    let store = store.clone();
    Ok(Rc::new(move || store.dispatch(UiStateAction::release(id.clone()))))
}
