//! Single-entry memoization keyed by input identity.
//!
//! A [`Memo`] remembers its last input and output and recomputes only when
//! the new input is not the [`SameInput`] as the cached one. Chaining memos,
//! each fed by the previous one's output, gives a derivation pipeline in
//! which every stage invalidates on its own.
//!
//! ```rust
//! use std::rc::Rc;
//! use slate_core::Memo;
//!
//! let len = Memo::new(|s: &Rc<String>| s.len());
//! let text = Rc::new("slate".to_string());
//! assert_eq!(len.get(text.clone()), 5);
//! assert_eq!(len.get(text), 5);
//! assert_eq!(len.recomputations(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Change detection for memo inputs.
///
/// Shared values compare by pointer; owned scalars such as `String` compare
/// by value.
pub trait SameInput {
    fn same_input(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameInput for Rc<T> {
    fn same_input(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl SameInput for String {
    fn same_input(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: SameInput> SameInput for Option<T> {
    fn same_input(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_input(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<A: SameInput, B: SameInput> SameInput for (A, B) {
    fn same_input(&self, other: &Self) -> bool {
        self.0.same_input(&other.0) && self.1.same_input(&other.1)
    }
}

pub struct Memo<I, O> {
    compute: Box<dyn Fn(&I) -> O>,
    cached: RefCell<Option<(I, O)>>,
    recomputations: Cell<usize>,
}

impl<I: SameInput, O: Clone> Memo<I, O> {
    pub fn new(compute: impl Fn(&I) -> O + 'static) -> Self {
        Self {
            compute: Box::new(compute),
            cached: RefCell::new(None),
            recomputations: Cell::new(0),
        }
    }

    pub fn get(&self, input: I) -> O {
        if let Some((prev, out)) = self.cached.borrow().as_ref()
            && prev.same_input(&input)
        {
            return out.clone();
        }
        let out = (self.compute)(&input);
        self.recomputations.set(self.recomputations.get() + 1);
        *self.cached.borrow_mut() = Some((input, out.clone()));
        out
    }

    pub fn invalidate(&self) {
        *self.cached.borrow_mut() = None;
    }

    /// How many times the compute function has run.
    pub fn recomputations(&self) -> usize {
        self.recomputations.get()
    }
}
