use serde::{Deserialize, Serialize};

use crate::branch::UiState;

/// Actions understood by [`reduce`](crate::reducer::reduce).
///
/// Encodes as `{"type": "SET_UI_STATE", "payload": {"id": .., "state": {..}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum UiStateAction {
    /// Shallow-merge `state` into the entry for `id`.
    ///
    /// `seed` is the wrapping's default state. It becomes the prior value
    /// when `id` has no entry yet and is ignored afterwards.
    #[serde(rename = "SET_UI_STATE")]
    Set {
        id: String,
        state: UiState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<UiState>,
    },
    /// Drop the entry for `id`. Never dispatched implicitly.
    #[serde(rename = "RELEASE_UI_STATE")]
    Release { id: String },
}

impl UiStateAction {
    pub const SET: &'static str = "SET_UI_STATE";
    pub const RELEASE: &'static str = "RELEASE_UI_STATE";

    pub fn set(id: impl Into<String>, state: UiState) -> Self {
        Self::Set {
            id: id.into(),
            state,
            seed: None,
        }
    }

    pub fn set_seeded(id: impl Into<String>, state: UiState, seed: Option<UiState>) -> Self {
        Self::Set {
            id: id.into(),
            state,
            seed,
        }
    }

    pub fn release(id: impl Into<String>) -> Self {
        Self::Release { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Set { id, .. } | Self::Release { id } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set { .. } => Self::SET,
            Self::Release { .. } => Self::RELEASE,
        }
    }
}
