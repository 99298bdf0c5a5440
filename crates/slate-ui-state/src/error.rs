use slate_core::CoreError;
use thiserror::Error;

use crate::branch::DEFAULT_BRANCH_KEY;

/// Configuration errors. These point at a wiring mistake in the caller and
/// are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiStateError {
    #[error("{component}: ui state id did not resolve to a non-empty string for the given props")]
    UnresolvedId { component: String },
    #[error(
        "{component}: ui state branch not found; register the reducer under `{key}` \
         or pass a branch selector that points at it",
        key = DEFAULT_BRANCH_KEY
    )]
    BranchUnreachable { component: String },
    #[error("expected a JSON object for ui state, found {found}")]
    NotAnObject { found: &'static str },
    #[error(transparent)]
    Core(#[from] CoreError),
}
