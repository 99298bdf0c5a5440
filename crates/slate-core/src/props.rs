use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::CoreError;

/// Input properties handed to a component: a string-keyed bag of shared,
/// type-erased values.
///
/// Cloning is cheap; values are reference counted and never copied.
#[derive(Clone, Default)]
pub struct Props {
    values: BTreeMap<String, Rc<dyn Any>>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: 'static>(mut self, key: impl Into<String>, value: T) -> Self {
        self.set(key, value);
        self
    }

    pub fn set<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Rc::new(value));
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// `None` when the key is missing or holds another type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    /// Like [`Props::get`], but a present value of the wrong type is an error.
    pub fn try_get<T: 'static>(&self, key: &str) -> Result<Option<&T>, CoreError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(v) => v.downcast_ref::<T>().map(Some).ok_or_else(|| CoreError::PropType {
                key: key.to_owned(),
                expected: type_name::<T>(),
            }),
        }
    }

    /// Reads a string prop stored either as `String` or `&'static str`.
    pub fn str(&self, key: &str) -> Option<&str> {
        let v = self.values.get(key)?;
        v.downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| v.downcast_ref::<&'static str>().copied())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy of `self` with every entry of `overlay` written on top.
    pub fn merged(&self, overlay: &Props) -> Props {
        let mut out = self.clone();
        for (k, v) in &overlay.values {
            out.values.insert(k.clone(), v.clone());
        }
        out
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// A component definition: renders props into some output.
pub type Component<O> = Rc<dyn Fn(&Props) -> O>;

pub fn component<O>(f: impl Fn(&Props) -> O + 'static) -> Component<O> {
    Rc::new(f)
}
