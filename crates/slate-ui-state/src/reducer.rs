use std::any::Any;
use std::rc::Rc;

use slate_core::StoreBuilder;

use crate::action::UiStateAction;
use crate::branch::{DEFAULT_BRANCH_KEY, UiState, UiStateBranch, merge};

/// Reduces the ui state branch.
///
/// With no prior branch the result starts from an empty components map.
/// Actions other than [`UiStateAction`] return the prior `Rc` itself, and a
/// write rebuilds only the touched entry; all other entries stay shared.
pub fn reduce(branch: Option<&Rc<UiStateBranch>>, action: &dyn Any) -> Rc<UiStateBranch> {
    let current = branch.cloned().unwrap_or_default();
    match action.downcast_ref::<UiStateAction>() {
        Some(UiStateAction::Set { id, state, seed }) => {
            let empty = UiState::new();
            let prior = current
                .components
                .get(id)
                .map(|entry| &**entry)
                .or(seed.as_ref())
                .unwrap_or(&empty);
            let next = merge(prior, state);
            log::trace!("ui state `{id}` <- {} field(s)", state.len());

            let mut components = (*current.components).clone();
            components.insert(id.clone(), Rc::new(next));
            Rc::new(UiStateBranch {
                components: Rc::new(components),
            })
        }
        Some(UiStateAction::Release { id }) if current.contains(id) => {
            log::debug!("ui state `{id}` released");
            let mut components = (*current.components).clone();
            components.remove(id);
            Rc::new(UiStateBranch {
                components: Rc::new(components),
            })
        }
        _ => current,
    }
}

/// Registers [`reduce`] under [`DEFAULT_BRANCH_KEY`]. Once per store.
pub fn register(builder: StoreBuilder) -> StoreBuilder {
    register_at(builder, DEFAULT_BRANCH_KEY)
}

/// Registers [`reduce`] under a custom slice key; pair it with
/// [`locator_at`](crate::branch::locator_at) on the reading side.
pub fn register_at(builder: StoreBuilder, key: impl Into<String>) -> StoreBuilder {
    builder.slice(key, reduce)
}
