//! Scopes and mount effects.
//!
//! A [`Scope`] owns cleanups for everything composed under it. `Root` runs
//! each composition pass inside its scope and disposes it on drop, which is
//! when `on_unmount` cleanups fire.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::remember;

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with this scope installed as the current one.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Weak<ScopeInner>>);
        impl Drop for Restore {
            fn drop(&mut self) {
                let prev = self.0.take();
                CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
            }
        }

        let prev = CURRENT_SCOPE.with(|current| {
            current
                .borrow_mut()
                .replace(Rc::downgrade(&self.inner))
        });
        let _restore = Restore(prev);
        f()
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn pending_disposers(&self) -> usize {
        self.inner.disposers.borrow().len()
    }

    /// Runs registered cleanups, most recent first. Safe to call repeatedly.
    pub fn dispose(&self) {
        let disposers = std::mem::take(&mut *self.inner.disposers.borrow_mut());
        for disposer in disposers.into_iter().rev() {
            disposer();
        }
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    })
}

/// Cleanup handle; runs at most once.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }
}

pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

struct EffectSlot<K> {
    key: Option<K>,
    cleanup: Option<Dispose>,
    installed: bool,
}

/// Runs `effect` on first composition and again whenever `key` changes.
///
/// The previous cleanup runs before a re-run and when the enclosing scope is
/// disposed. Slot based: the call must sit at a stable position in the
/// composition. Outside a composition pass there is no slot to remember the
/// key, so the effect runs on every call.
pub fn disposable_effect<K: PartialEq + 'static>(key: K, effect: impl FnOnce() -> Dispose) {
    let slot = remember(|| {
        RefCell::new(EffectSlot::<K> {
            key: None,
            cleanup: None,
            installed: false,
        })
    });

    let install = !std::mem::replace(&mut slot.borrow_mut().installed, true);
    if install && let Some(scope) = current_scope() {
        let slot = slot.clone();
        scope.add_disposer(move || {
            let cleanup = slot.borrow_mut().cleanup.take();
            if let Some(d) = cleanup {
                d.run();
            }
        });
    }

    if slot.borrow().key.as_ref() == Some(&key) {
        return;
    }

    let previous = {
        let mut s = slot.borrow_mut();
        s.key = Some(key);
        s.cleanup.take()
    };
    if let Some(d) = previous {
        d.run();
    }

    // The effect may dispatch and re-enter composition helpers; no borrow is held here.
    let d = effect();
    slot.borrow_mut().cleanup = Some(d);
}
