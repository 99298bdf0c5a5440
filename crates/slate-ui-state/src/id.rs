use std::fmt;
use std::rc::Rc;

use slate_core::Props;

use crate::error::UiStateError;

/// Key of a component instance's slice of ui state.
#[derive(Clone)]
pub enum UiStateId {
    Literal(String),
    Derived(Rc<dyn Fn(&Props) -> Option<String>>),
}

impl UiStateId {
    pub fn from_fn(f: impl Fn(&Props) -> Option<String> + 'static) -> Self {
        Self::Derived(Rc::new(f))
    }

    /// Id taken from the string prop `key` of each instance.
    pub fn from_prop(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::from_fn(move |props| props.str(&key).map(str::to_owned))
    }

    pub fn resolve(&self, props: &Props) -> Option<String> {
        match self {
            Self::Literal(id) => Some(id.clone()),
            Self::Derived(f) => f(props),
        }
    }

    /// Resolves for a read or a write. An unresolved or empty id is an error;
    /// falling back to a shared placeholder would make instances collide.
    pub fn require(&self, props: &Props, component: &str) -> Result<String, UiStateError> {
        self.resolve(props)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| UiStateError::UnresolvedId {
                component: component.to_owned(),
            })
    }
}

impl From<&str> for UiStateId {
    fn from(id: &str) -> Self {
        Self::Literal(id.to_owned())
    }
}

impl From<String> for UiStateId {
    fn from(id: String) -> Self {
        Self::Literal(id)
    }
}

impl fmt::Debug for UiStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(id) => f.debug_tuple("Literal").field(id).finish(),
            Self::Derived(_) => f.write_str("Derived(<fn>)"),
        }
    }
}
