//! # Store
//!
//! A single-threaded, synchronously dispatched state container. The state
//! tree is a set of named *slices*; each slice is owned by one reducer
//! registered on the [`StoreBuilder`].
//!
//! ```rust
//! use std::any::Any;
//! use std::rc::Rc;
//! use slate_core::*;
//!
//! #[derive(Debug)]
//! struct Bump;
//!
//! fn counter(prev: Option<&Rc<u32>>, action: &dyn Any) -> Rc<u32> {
//!     let prev = prev.cloned().unwrap_or_default();
//!     if action.is::<Bump>() { Rc::new(*prev + 1) } else { prev }
//! }
//!
//! let store = Store::builder().slice("count", counter).build();
//! store.dispatch(Bump);
//! assert_eq!(store.get_state().slice::<u32>("count").as_deref(), Some(&1));
//! ```
//!
//! Reducers receive every action as `&dyn Any` and must return the previous
//! `Rc` untouched for actions they do not handle; the store keeps untouched
//! slices pointer-identical so memoized selectors downstream stay warm.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::error::CoreError;
use crate::signal::{Signal, SubId, signal};

/// Anything dispatchable: every `'static` debuggable type.
pub trait Action: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> Action for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Dispatched once by [`StoreBuilder::build`] so reducers produce their initial slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Init;

type SliceReducer = Box<dyn Fn(Option<&Rc<dyn Any>>, &dyn Any) -> Rc<dyn Any>>;
type ActionListener = Rc<dyn Fn(&dyn Action, &StateTree)>;

/// Immutable snapshot of every slice.
#[derive(Clone, Default)]
pub struct StateTree {
    slices: BTreeMap<String, Rc<dyn Any>>,
}

impl StateTree {
    /// `None` when the slice is missing or holds another type.
    pub fn slice<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
        self.slices.get(key)?.clone().downcast::<T>().ok()
    }

    pub fn try_slice<T: 'static>(&self, key: &str) -> Result<Option<Rc<T>>, CoreError> {
        match self.slices.get(key) {
            None => Ok(None),
            Some(s) => s.clone().downcast::<T>().map(Some).map_err(|_| CoreError::SliceType {
                key: key.to_owned(),
            }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slices.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }
}

impl fmt::Debug for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTree")
            .field("slices", &self.slices.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct StoreBuilder {
    reducers: Vec<(String, SliceReducer)>,
}

impl StoreBuilder {
    /// Registers `reducer` as the owner of slice `key`. Registering the same
    /// key twice replaces the earlier reducer.
    pub fn slice<T: 'static>(
        mut self,
        key: impl Into<String>,
        reducer: impl Fn(Option<&Rc<T>>, &dyn Any) -> Rc<T> + 'static,
    ) -> Self {
        let key = key.into();
        let erased: SliceReducer = Box::new(
            move |prev: Option<&Rc<dyn Any>>, action: &dyn Any| -> Rc<dyn Any> {
                let prev = prev.and_then(|p| p.clone().downcast::<T>().ok());
                reducer(prev.as_ref(), action)
            },
        );
        if let Some(existing) = self.reducers.iter_mut().find(|(k, _)| *k == key) {
            log::warn!("store: slice `{key}` registered twice; the later reducer wins");
            existing.1 = erased;
        } else {
            self.reducers.push((key, erased));
        }
        self
    }

    pub fn build(self) -> Store {
        let mut slices = BTreeMap::new();
        for (key, reducer) in &self.reducers {
            slices.insert(key.clone(), reducer(None, &Init));
        }
        log::debug!("store built with {} slice(s)", slices.len());
        Store {
            inner: Rc::new(StoreInner {
                reducers: self.reducers,
                state: RefCell::new(Rc::new(StateTree { slices })),
                version: signal(0),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }
}

/// Cloneable handle to a shared container.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

struct StoreInner {
    reducers: Vec<(String, SliceReducer)>,
    state: RefCell<Rc<StateTree>>,
    version: Signal<u64>,
    queue: RefCell<VecDeque<Box<dyn Action>>>,
    dispatching: Cell<bool>,
    listeners: RefCell<Vec<(SubId, ActionListener)>>,
    next_listener: Cell<SubId>,
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    pub fn get_state(&self) -> Rc<StateTree> {
        self.inner.state.borrow().clone()
    }

    /// Number of actions fully applied so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn dispatch<A: Action>(&self, action: A) {
        self.dispatch_boxed(Box::new(action));
    }

    /// Applies `action` and notifies subscribers before returning.
    ///
    /// A dispatch made while another is in progress (from a reducer,
    /// listener or subscriber) is queued and applied by the outer call, in
    /// order, before it returns.
    pub fn dispatch_boxed(&self, action: Box<dyn Action>) {
        self.inner.queue.borrow_mut().push_back(action);
        if self.inner.dispatching.replace(true) {
            log::trace!("store: nested dispatch queued");
            return;
        }

        struct Reset<'a>(&'a Cell<bool>);
        impl Drop for Reset<'_> {
            fn drop(&mut self) {
                self.0.set(false);
            }
        }
        let _reset = Reset(&self.inner.dispatching);

        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(action) = next else { break };
            self.apply(&*action);
        }
    }

    fn apply(&self, action: &dyn Action) {
        log::debug!("store: dispatch {action:?}");
        let prev = self.get_state();
        let mut slices = BTreeMap::new();
        let mut changed = false;
        for (key, reducer) in &self.inner.reducers {
            let before = prev.slices.get(key);
            let after = reducer(before, action.as_any());
            changed |= !before.is_some_and(|b| Rc::ptr_eq(b, &after));
            slices.insert(key.clone(), after);
        }
        if changed {
            *self.inner.state.borrow_mut() = Rc::new(StateTree { slices });
        }

        let state = self.get_state();
        let listeners: Vec<ActionListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for l in listeners {
            l(action, &state);
        }

        self.inner.version.update(|v| *v += 1);
    }

    /// Called with the new version after every applied action.
    pub fn subscribe(&self, f: impl Fn(u64) + 'static) -> SubId {
        self.inner.version.subscribe(move |v| f(*v))
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.inner.version.unsubscribe(id)
    }

    /// Observes each applied action together with the resulting state.
    pub fn on_action(&self, f: impl Fn(&dyn Action, &StateTree) + 'static) -> SubId {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn remove_action_listener(&self, id: SubId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != before
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version())
            .field("state", &*self.get_state())
            .finish()
    }
}
