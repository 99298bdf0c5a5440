use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use slate_core::StateTree;

use crate::error::UiStateError;

/// Slice key the reducer is registered under unless told otherwise.
pub const DEFAULT_BRANCH_KEY: &str = "ui_state";

/// One component's state: an arbitrary JSON object.
pub type UiState = Map<String, Value>;

/// Id to state. Entries are shared so untouched ones keep their identity
/// across reductions.
pub type Components = Rc<BTreeMap<String, Rc<UiState>>>;

/// Finds the branch inside the whole state tree.
pub type BranchLocator = Rc<dyn Fn(&StateTree) -> Option<Rc<UiStateBranch>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiStateBranch {
    pub components: Components,
}

impl UiStateBranch {
    pub fn get(&self, id: &str) -> Option<&Rc<UiState>> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Locator for a branch registered at `key`.
pub fn locator_at(key: impl Into<String>) -> BranchLocator {
    let key = key.into();
    Rc::new(move |tree: &StateTree| tree.slice::<UiStateBranch>(&key))
}

pub fn default_locator() -> BranchLocator {
    locator_at(DEFAULT_BRANCH_KEY)
}

pub fn locator(f: impl Fn(&StateTree) -> Option<Rc<UiStateBranch>> + 'static) -> BranchLocator {
    Rc::new(f)
}

/// Shallow merge: every field of `partial` replaces the one in `prior`;
/// fields only in `prior` are kept.
pub fn merge(prior: &UiState, partial: &UiState) -> UiState {
    let mut next = prior.clone();
    for (k, v) in partial {
        next.insert(k.clone(), v.clone());
    }
    next
}

/// Converts an arbitrary JSON value into a state object.
pub fn to_ui_state(value: Value) -> Result<UiState, UiStateError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(UiStateError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

/// Serializes any struct into a state object.
pub fn ui_state_from<T: Serialize>(value: &T) -> Result<UiState, UiStateError> {
    let value = serde_json::to_value(value).map_err(|_| UiStateError::NotAnObject {
        found: "unserializable value",
    })?;
    to_ui_state(value)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Typed reads out of a [`UiState`].
pub trait UiStateExt {
    /// `None` when the field is missing or does not deserialize as `T`.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T>;
}

impl UiStateExt for UiState {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        T::deserialize(self.get(key)?).ok()
    }
}
