use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use slate_core::{Component, Props, Store, component, remember};

use crate::branch::{BranchLocator, UiState};
use crate::dispatch::{ReleaseUiState, SetUiState, bind_release, bind_setter};
use crate::error::UiStateError;
use crate::id::UiStateId;
use crate::prop;
use crate::select::UiStatePipeline;

/// What the read side hands to a wrapped component.
#[derive(Clone, Debug)]
pub struct StateProps {
    pub ui_state: Option<Rc<UiState>>,
}

/// What the write side hands to a wrapped component.
#[derive(Clone)]
pub struct DispatchProps {
    pub set_ui_state: SetUiState,
    pub release_ui_state: ReleaseUiState,
}

/// Maps (state props, dispatch props, own props) to the extra props a
/// wrapped component receives. Own props are layered on top of the result.
pub type TransformProps = Rc<dyn Fn(&StateProps, &DispatchProps, &Props) -> Props>;

#[derive(Clone)]
pub struct UiStateConfig {
    pub id: UiStateId,
    /// Seeds an id's entry on its first write from this wrapping.
    pub initial_state: Option<Rc<UiState>>,
    pub transform_props: Option<TransformProps>,
    /// Used when props carry no `ui_state_branch_selector`.
    pub branch_selector: Option<BranchLocator>,
    /// Shown in warnings and errors.
    pub name: Option<String>,
}

impl UiStateConfig {
    pub fn new(id: impl Into<UiStateId>) -> Self {
        Self {
            id: id.into(),
            initial_state: None,
            transform_props: None,
            branch_selector: None,
            name: None,
        }
    }

    pub fn initial_state(mut self, state: UiState) -> Self {
        self.initial_state = Some(Rc::new(state));
        self
    }

    pub fn transform_props(
        mut self,
        f: impl Fn(&StateProps, &DispatchProps, &Props) -> Props + 'static,
    ) -> Self {
        self.transform_props = Some(Rc::new(f));
        self
    }

    pub fn branch_selector(mut self, locator: BranchLocator) -> Self {
        self.branch_selector = Some(locator);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> String {
        match (&self.name, &self.id) {
            (Some(name), _) => name.clone(),
            (None, UiStateId::Literal(id)) => format!("ui_state({id})"),
            (None, UiStateId::Derived(_)) => "ui_state(<derived id>)".to_owned(),
        }
    }
}

impl fmt::Debug for UiStateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiStateConfig")
            .field("id", &self.id)
            .field("initial_state", &self.initial_state)
            .field("transform_props", &self.transform_props.is_some())
            .field("branch_selector", &self.branch_selector.is_some())
            .field("name", &self.name)
            .finish()
    }
}

/// Wraps `inner` so each rendered instance reads and writes its own keyed
/// entry of the ui state branch in `store`.
///
/// The reducer must already be registered on the store (see
/// [`register`](crate::reducer::register)).
pub fn wrap<O: 'static>(
    store: &Store,
    inner: Component<O>,
    config: UiStateConfig,
) -> WrappedComponent<O> {
    WrappedComponent {
        store: store.clone(),
        inner,
        config: Rc::new(config),
    }
}

/// A wrapped component definition. Cheap to clone; every instance made from
/// it keeps its own selection cache.
pub struct WrappedComponent<O> {
    store: Store,
    inner: Component<O>,
    config: Rc<UiStateConfig>,
}

impl<O> Clone for WrappedComponent<O> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            inner: self.inner.clone(),
            config: self.config.clone(),
        }
    }
}

impl<O: 'static> WrappedComponent<O> {
    pub fn config(&self) -> &UiStateConfig {
        &self.config
    }

    /// A new instance with an empty selection cache.
    pub fn mount(&self) -> UiStateInstance<O> {
        let name = self.config.display_name();
        log::trace!("{name}: instance mounted");
        UiStateInstance {
            pipeline: UiStatePipeline::new(
                self.config.id.clone(),
                self.config.branch_selector.clone(),
                name.clone(),
            ),
            store: self.store.clone(),
            inner: self.inner.clone(),
            config: self.config.clone(),
            name,
        }
    }

    /// Renders inside a composition pass, keeping the instance in a
    /// `remember` slot. Outside a pass a throwaway instance is used.
    ///
    /// A slot that holds an instance of another definition (conditional
    /// rendering swapped definitions at this position) is remounted.
    pub fn render(&self, props: &Props) -> Result<O, UiStateError> {
        let slot = remember(|| RefCell::new(Rc::new(self.mount())));
        let instance = {
            let mut current = slot.borrow_mut();
            if !current.belongs_to(self) {
                log::debug!(
                    "{}: slot held another definition's instance; remounting",
                    self.config.display_name()
                );
                *current = Rc::new(self.mount());
            }
            current.clone()
        };
        instance.render(props)
    }

    pub fn into_component(self) -> Component<Result<O, UiStateError>> {
        component(move |props: &Props| self.render(props))
    }
}

/// One live instance of a wrapped component.
pub struct UiStateInstance<O> {
    store: Store,
    inner: Component<O>,
    config: Rc<UiStateConfig>,
    pipeline: UiStatePipeline,
    name: String,
}

impl<O> UiStateInstance<O> {
    /// True when this instance was mounted from `definition` or a clone of it.
    pub fn belongs_to(&self, definition: &WrappedComponent<O>) -> bool {
        Rc::ptr_eq(&self.config, &definition.config) && Rc::ptr_eq(&self.inner, &definition.inner)
    }

    pub fn pipeline(&self) -> &UiStatePipeline {
        &self.pipeline
    }

    pub fn state_props(&self, props: &Props) -> Result<StateProps, UiStateError> {
        let tree = self.store.get_state();
        Ok(StateProps {
            ui_state: self.pipeline.select(&tree, props)?,
        })
    }

    pub fn dispatch_props(&self, props: &Props) -> Result<DispatchProps, UiStateError> {
        let id = &self.config.id;
        Ok(DispatchProps {
            set_ui_state: bind_setter(
                &self.store,
                id,
                props,
                self.config.initial_state.clone(),
                &self.name,
            )?,
            release_ui_state: bind_release(&self.store, id, props, &self.name)?,
        })
    }

    /// The full props the inner component receives for `own`.
    pub fn props(&self, own: &Props) -> Result<Props, UiStateError> {
        let state = self.state_props(own)?;
        let dispatch = self.dispatch_props(own)?;
        Ok(match &self.config.transform_props {
            Some(transform) => transform(&state, &dispatch, own).merged(own),
            None => own.merged(
                &Props::new()
                    .with(prop::UI_STATE, state.ui_state)
                    .with(prop::SET_UI_STATE, dispatch.set_ui_state)
                    .with(prop::RELEASE_UI_STATE, dispatch.release_ui_state),
            ),
        })
    }

    pub fn render(&self, own: &Props) -> Result<O, UiStateError> {
        let props = self.props(own)?;
        Ok((self.inner)(&props))
    }
}

/// The injected state, as a wrapped component without a transform sees it.
pub fn ui_state_of(props: &Props) -> Option<Rc<UiState>> {
    props
        .get::<Option<Rc<UiState>>>(prop::UI_STATE)
        .cloned()
        .flatten()
}

pub fn setter_of(props: &Props) -> Option<SetUiState> {
    props.get::<SetUiState>(prop::SET_UI_STATE).cloned()
}

pub fn release_of(props: &Props) -> Option<ReleaseUiState> {
    props.get::<ReleaseUiState>(prop::RELEASE_UI_STATE).cloned()
}
