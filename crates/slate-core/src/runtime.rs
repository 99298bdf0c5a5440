use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::effects::Scope;
use crate::signal::SubId;
use crate::store::Store;

thread_local! {
    static COMPOSER: RefCell<Composer> = RefCell::new(Composer::default());
}

/// Upper bound on passes `Root::settle` runs while mount effects keep dispatching.
pub const MAX_SETTLE_PASSES: usize = 16;

/// Per-thread slot storage for the active composition.
#[derive(Default)]
pub struct Composer {
    slots: Vec<Option<Box<dyn Any>>>,
    cursor: usize,
    keyed_slots: HashMap<String, Box<dyn Any>>,
    active: bool,
}

impl Composer {
    fn clear(&mut self) {
        self.slots.clear();
        self.keyed_slots.clear();
        self.cursor = 0;
    }
}

/// Marks a composition pass; slots are only remembered while one is alive.
pub struct ComposeGuard {
    _private: (),
}

impl ComposeGuard {
    pub fn begin() -> Self {
        COMPOSER.with(|c| {
            let mut c = c.borrow_mut();
            c.cursor = 0;
            c.active = true;
        });
        ComposeGuard { _private: () }
    }
}

impl Drop for ComposeGuard {
    fn drop(&mut self) {
        COMPOSER.with(|c| c.borrow_mut().active = false);
    }
}

pub fn is_composing() -> bool {
    COMPOSER.with(|c| c.borrow().active)
}

/// Slot-based remember: the Nth call in a pass gets the Nth stored value.
///
/// `init` runs without the composer borrowed, so it may itself call
/// `remember`. Outside a pass the value is built fresh on every call.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let cursor = COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        if !c.active {
            return None;
        }
        let cursor = c.cursor;
        c.cursor += 1;
        if cursor >= c.slots.len() {
            c.slots.resize_with(cursor + 1, || None);
        }
        Some(cursor)
    });

    let Some(cursor) = cursor else {
        log::trace!("remember called outside a composition pass");
        return Rc::new(init());
    };

    let existing = COMPOSER.with(|c| {
        let c = c.borrow();
        c.slots[cursor]
            .as_ref()
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned())
    });

    match existing {
        Some(Some(rc)) => rc,
        found => {
            if found.is_some() {
                log::warn!(
                    "remember: slot {cursor} changed type; replacing. \
                     Conditional composition should use remember_with_key."
                );
            }
            let rc = Rc::new(init());
            COMPOSER.with(|c| c.borrow_mut().slots[cursor] = Some(Box::new(rc.clone())));
            rc
        }
    }
}

/// Key-based remember, stable across conditional branches.
///
/// Like [`remember`], the value is built fresh outside a pass and nothing is
/// stored.
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    if !is_composing() {
        log::trace!("remember_with_key called outside a composition pass");
        return Rc::new(init());
    }
    let key = key.into();
    let existing = COMPOSER.with(|c| {
        c.borrow()
            .keyed_slots
            .get(&key)
            .map(|slot| slot.downcast_ref::<Rc<T>>().cloned())
    });

    match existing {
        Some(Some(rc)) => rc,
        found => {
            if found.is_some() {
                log::warn!("remember_with_key: key '{key}' reused with a different type; replacing.");
            }
            let rc = Rc::new(init());
            COMPOSER.with(|c| {
                c.borrow_mut().keyed_slots.insert(key, Box::new(rc.clone()));
            });
            rc
        }
    }
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

/// Drives composition passes for one tree and re-renders on store changes.
///
/// One `Root` per thread: slot storage is thread-local and is reset when a
/// root is created or dropped.
pub struct Root<O> {
    store: Store,
    build: Box<dyn Fn() -> O>,
    scope: Scope,
    dirty: Rc<Cell<bool>>,
    subscription: SubId,
    passes: u64,
}

impl<O> Root<O> {
    pub fn new(store: &Store, build: impl Fn() -> O + 'static) -> Self {
        COMPOSER.with(|c| c.borrow_mut().clear());
        let dirty = Rc::new(Cell::new(true));
        let subscription = store.subscribe({
            let dirty = dirty.clone();
            move |_| dirty.set(true)
        });
        Self {
            store: store.clone(),
            build: Box::new(build),
            scope: Scope::new(),
            dirty,
            subscription,
            passes: 0,
        }
    }

    /// True when the store changed since the start of the last pass.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Runs one composition pass unconditionally.
    pub fn render(&mut self) -> O {
        // Cleared first so dispatches made during the pass leave the root dirty.
        self.dirty.set(false);
        let _guard = ComposeGuard::begin();
        let out = self.scope.run(|| (self.build)());
        self.passes += 1;
        log::trace!("composition pass {} done", self.passes);
        out
    }

    pub fn render_if_dirty(&mut self) -> Option<O> {
        self.is_dirty().then(|| self.render())
    }

    /// Renders until a pass leaves the store untouched.
    pub fn settle(&mut self) -> O {
        let mut out = self.render();
        let mut passes = 1;
        while self.is_dirty() && passes < MAX_SETTLE_PASSES {
            out = self.render();
            passes += 1;
        }
        if self.is_dirty() {
            log::warn!("root still dirty after {MAX_SETTLE_PASSES} passes; a mount effect keeps dispatching");
        }
        out
    }
}

impl<O> Drop for Root<O> {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
        self.scope.dispose();
        COMPOSER.with(|c| c.borrow_mut().clear());
    }
}
