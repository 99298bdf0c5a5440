//! # Keyed UI state
//!
//! Components often need a little state of their own (an open flag, a
//! selected tab, a draft value) but still want it in the central
//! [`Store`](slate_core::Store)
//! where it can be inspected and driven by actions. This crate gives each
//! component instance a private, keyed entry in one shared branch of the
//! store without the component knowing where that branch lives.
//!
//! - A reducer ([`reduce`]) owns the branch, registered once per store.
//! - [`wrap`] turns a component into one that receives its entry as
//!   `ui_state` and a bound `set_ui_state` setter among its props.
//! - The entry's key is a [`UiStateId`]: a literal or a function of props.
//!
//! ```rust
//! use slate_core::*;
//! use slate_ui_state::*;
//!
//! let store = reducer::register(Store::builder()).build();
//!
//! let toggle = wrap(
//!     &store,
//!     component(|props: &Props| {
//!         let open = ui_state_of(props)
//!             .and_then(|s| s.get_as::<bool>("open"))
//!             .unwrap_or(false);
//!         (open, setter_of(props))
//!     }),
//!     UiStateConfig::new("menu").initial_state(ui_state!({ "open": false })),
//! );
//!
//! let instance = toggle.mount();
//! let (open, set) = instance.render(&Props::new()).unwrap();
//! assert!(!open);
//!
//! set.unwrap()(ui_state!({ "open": true }));
//! let (open, _) = instance.render(&Props::new()).unwrap();
//! assert!(open);
//! ```
//!
//! Two instances resolving to the same id share one entry; different ids
//! never see each other's writes. Reading an id that was never written gives
//! `None` and logs a warning. An id that does not resolve, or a branch that
//! cannot be found, is a [`UiStateError`].
//!
//! Entries are never removed implicitly. Components with per-mount ids should
//! call the injected `release_ui_state` when they go away.

pub mod action;
pub mod branch;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod reducer;
pub mod select;
pub mod wrap;

#[cfg(test)]
mod tests;

pub use action::UiStateAction;
pub use branch::{
    BranchLocator, Components, DEFAULT_BRANCH_KEY, UiState, UiStateBranch, UiStateExt,
    default_locator, locator, locator_at, merge, to_ui_state, ui_state_from,
};
pub use dispatch::{ReleaseUiState, SetUiState, bind_release, bind_setter};
pub use error::UiStateError;
pub use id::UiStateId;
pub use reducer::{reduce, register, register_at};
pub use select::{Recomputations, UiStatePipeline};
pub use wrap::{
    DispatchProps, StateProps, TransformProps, UiStateConfig, UiStateInstance, WrappedComponent,
    release_of, setter_of, ui_state_of, wrap,
};

/// Prop names read or injected by wrapped components.
pub mod prop {
    /// `Option<Rc<UiState>>`
    pub const UI_STATE: &str = "ui_state";
    /// [`SetUiState`](crate::SetUiState)
    pub const SET_UI_STATE: &str = "set_ui_state";
    /// [`ReleaseUiState`](crate::ReleaseUiState)
    pub const RELEASE_UI_STATE: &str = "release_ui_state";
    /// Optional [`BranchLocator`](crate::BranchLocator) overriding where the
    /// branch is read from.
    pub const BRANCH_SELECTOR: &str = "ui_state_branch_selector";
}

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Builds a [`UiState`] from a JSON object literal.
///
/// Panics if the literal is not an object; use [`to_ui_state`] for values
/// built at runtime.
#[macro_export]
macro_rules! ui_state {
    ($($json:tt)+) => {
        match $crate::__serde_json::json!($($json)+) {
            $crate::__serde_json::Value::Object(map) => map,
            other => panic!("ui_state! expects a JSON object, got {other}"),
        }
    };
}
