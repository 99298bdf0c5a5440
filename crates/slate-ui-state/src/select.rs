//! Memoized read path from the whole state tree to one instance's state.
//!
//! Four [`Memo`] stages, each keyed by the identity of its inputs:
//!
//! 1. branch locator: the `ui_state_branch_selector` prop, else the
//!    wrapping's configured locator, else [`default_locator`];
//! 2. branch: the locator applied to the state tree;
//! 3. components map of that branch;
//! 4. the entry for the resolved id.
//!
//! A reduction that leaves the branch alone keeps stages 3 and 4 cached. A
//! write to another id re-runs the lookups but yields the same entry `Rc`.

use std::rc::Rc;

use slate_core::{Memo, Props, StateTree};

use crate::branch::{BranchLocator, Components, UiState, UiStateBranch, default_locator};
use crate::error::UiStateError;
use crate::id::UiStateId;
use crate::prop;

pub struct UiStatePipeline {
    id: UiStateId,
    component: String,
    locator: Memo<Option<BranchLocator>, BranchLocator>,
    branch: Memo<(BranchLocator, Rc<StateTree>), Result<Rc<UiStateBranch>, UiStateError>>,
    components: Memo<Rc<UiStateBranch>, Components>,
    entry: Memo<(Components, String), Option<Rc<UiState>>>,
}

/// Recompute counts per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recomputations {
    pub locator: usize,
    pub branch: usize,
    pub components: usize,
    pub entry: usize,
}

impl UiStatePipeline {
    /// `fallback` is used when props carry no branch selector; without one
    /// the branch is looked up at the default slice key.
    pub fn new(
        id: UiStateId,
        fallback: Option<BranchLocator>,
        component: impl Into<String>,
    ) -> Self {
        let component = component.into();
        let fallback = fallback.unwrap_or_else(default_locator);

        let locator = Memo::new(move |over: &Option<BranchLocator>| {
            over.clone().unwrap_or_else(|| fallback.clone())
        });

        let branch = Memo::new({
            let component = component.clone();
            move |(locate, tree): &(BranchLocator, Rc<StateTree>)| {
                locate(&**tree).ok_or_else(|| UiStateError::BranchUnreachable {
                    component: component.clone(),
                })
            }
        });

        let components = Memo::new(|branch: &Rc<UiStateBranch>| branch.components.clone());

        let entry = Memo::new({
            let component = component.clone();
            move |(components, id): &(Components, String)| {
                let found = components.get(id).cloned();
                if found.is_none() {
                    log::warn!("{component}: ui state `{id}` read before it was initialized");
                }
                found
            }
        });

        Self {
            id,
            component,
            locator,
            branch,
            components,
            entry,
        }
    }

    pub fn id(&self) -> &UiStateId {
        &self.id
    }

    pub fn select_locator(&self, props: &Props) -> Result<BranchLocator, UiStateError> {
        let over = props
            .try_get::<BranchLocator>(prop::BRANCH_SELECTOR)?
            .cloned();
        Ok(self.locator.get(over))
    }

    pub fn select_branch(
        &self,
        tree: &Rc<StateTree>,
        props: &Props,
    ) -> Result<Rc<UiStateBranch>, UiStateError> {
        let locate = self.select_locator(props)?;
        self.branch.get((locate, tree.clone()))
    }

    pub fn select_components(
        &self,
        tree: &Rc<StateTree>,
        props: &Props,
    ) -> Result<Components, UiStateError> {
        let branch = self.select_branch(tree, props)?;
        Ok(self.components.get(branch))
    }

    /// State for this instance; `Ok(None)` until its first write.
    pub fn select(
        &self,
        tree: &Rc<StateTree>,
        props: &Props,
    ) -> Result<Option<Rc<UiState>>, UiStateError> {
        let components = self.select_components(tree, props)?;
        let id = self.id.require(props, &self.component)?;
        Ok(self.entry.get((components, id)))
    }

    pub fn recomputations(&self) -> Recomputations {
        Recomputations {
            locator: self.locator.recomputations(),
            branch: self.branch.recomputations(),
            components: self.components.recomputations(),
            entry: self.entry.recomputations(),
        }
    }
}
