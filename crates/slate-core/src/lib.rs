//! # Stores, Props, and Composition
//!
//! `slate-core` is the small host layer the rest of Slate builds on. It has
//! four pieces:
//!
//! - [`Store`]: one synchronously dispatched state container made of named
//!   slices, each owned by a reducer.
//! - [`Props`] and [`Component`]: a component is just
//!   `Rc<dyn Fn(&Props) -> O>`; props are a string-keyed bag of shared values.
//! - `remember*` and [`disposable_effect`]: slot storage and mount effects
//!   bound to a composition pass, driven by [`Root`].
//! - [`Memo`]: single-entry memoization keyed by input identity, the
//!   building block for selector pipelines.
//!
//! ## Components
//!
//! ```rust
//! use slate_core::*;
//!
//! let greet = component(|props: &Props| {
//!     format!("hello, {}", props.str("name").unwrap_or("stranger"))
//! });
//!
//! assert_eq!(greet(&Props::new().with("name", "ada")), "hello, ada");
//! assert_eq!(greet(&Props::new()), "hello, stranger");
//! ```
//!
//! ## Composition
//!
//! A [`Root`] subscribes to a [`Store`], runs the build closure inside a
//! composition pass and reports when the store changed since:
//!
//! ```rust
//! use std::any::Any;
//! use std::rc::Rc;
//! use slate_core::*;
//!
//! fn hits(prev: Option<&Rc<u32>>, action: &dyn Any) -> Rc<u32> {
//!     let prev = prev.cloned().unwrap_or_default();
//!     if action.is::<&str>() { Rc::new(*prev + 1) } else { prev }
//! }
//!
//! let store = Store::builder().slice("hits", hits).build();
//! let mut root = Root::new(&store, {
//!     let store = store.clone();
//!     move || {
//!         // Slot-based: the Nth `remember` in a pass always sees the Nth value.
//!         let renders = remember_state(|| 0);
//!         *renders.borrow_mut() += 1;
//!         let renders = *renders.borrow();
//!         (renders, store.get_state().slice::<u32>("hits").map(|h| *h))
//!     }
//! });
//!
//! assert_eq!(root.render(), (1, Some(0)));
//! store.dispatch("hit");
//! assert!(root.is_dirty());
//! assert_eq!(root.render(), (2, Some(1)));
//! ```
//!
//! Mount logic goes through [`disposable_effect`]; cleanups returned from it
//! run when the key changes or the root is dropped.

pub mod effects;
pub mod error;
pub mod memo;
pub mod prelude;
pub mod props;
pub mod runtime;
pub mod signal;
pub mod store;


pub use effects::*;
pub use error::*;
pub use memo::*;
pub use props::*;
pub use runtime::*;
pub use signal::*;
pub use store::*;
