use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use slate_core::{Action, StateTree, Store, SubId};
use slate_ui_state::{DEFAULT_BRANCH_KEY, UiStateAction, UiStateBranch};

/// Default number of actions an [`Inspector`] keeps.
pub const DEFAULT_HISTORY: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recorded {
    pub seq: u64,
    /// Ui state actions as their JSON encoding, anything else as its `Debug` text.
    pub action: Value,
    /// Number of entries in the ui state branch right after the action.
    pub ui_state_len: usize,
}

#[derive(Default)]
struct History {
    entries: VecDeque<Recorded>,
    next_seq: u64,
}

/// Records actions dispatched through a store.
pub struct Inspector {
    store: Store,
    history: Rc<RefCell<History>>,
    listener: SubId,
    branch_key: String,
}

impl Inspector {
    pub fn attach(store: &Store) -> Self {
        Self::new(store, DEFAULT_BRANCH_KEY, DEFAULT_HISTORY)
    }

    /// For a store whose reducer was registered with `register_at(.., key)`.
    pub fn attach_at(store: &Store, branch_key: impl Into<String>) -> Self {
        Self::new(store, branch_key, DEFAULT_HISTORY)
    }

    /// Keeps at most `capacity` actions, dropping the oldest.
    pub fn with_capacity(store: &Store, capacity: usize) -> Self {
        Self::new(store, DEFAULT_BRANCH_KEY, capacity)
    }

    pub fn new(store: &Store, branch_key: impl Into<String>, capacity: usize) -> Self {
        let history = Rc::new(RefCell::new(History::default()));
        let branch_key = branch_key.into();
        let listener = store.on_action({
            let history = history.clone();
            let branch_key = branch_key.clone();
            move |action, state| {
                let mut h = history.borrow_mut();
                let seq = h.next_seq;
                h.next_seq += 1;
                h.entries.push_back(Recorded {
                    seq,
                    action: describe(action),
                    ui_state_len: state
                        .slice::<UiStateBranch>(&branch_key)
                        .map_or(0, |b| b.len()),
                });
                while h.entries.len() > capacity {
                    h.entries.pop_front();
                }
            }
        });
        log::debug!("inspector attached to `{branch_key}` (capacity {capacity})");
        Self {
            store: store.clone(),
            history,
            listener,
            branch_key,
        }
    }

    pub fn history(&self) -> Vec<Recorded> {
        self.history.borrow().entries.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.history.borrow().entries.back().cloned()
    }

    pub fn branch_key(&self) -> &str {
        &self.branch_key
    }

    pub fn clear(&self) {
        self.history.borrow_mut().entries.clear();
    }

    /// The current ui state branch as JSON, `Value::Null` if it is missing.
    pub fn dump(&self) -> Value {
        dump_tree(&self.store.get_state(), &self.branch_key)
    }
}

impl Drop for Inspector {
    fn drop(&mut self) {
        self.store.remove_action_listener(self.listener);
    }
}

pub fn describe(action: &dyn Action) -> Value {
    match action.as_any().downcast_ref::<UiStateAction>() {
        Some(a) => serde_json::to_value(a).unwrap_or_else(|e| Value::String(e.to_string())),
        None => Value::String(format!("{action:?}")),
    }
}

/// `{ id: state, .. }` for every entry of `branch`.
pub fn dump_branch(branch: &UiStateBranch) -> Value {
    serde_json::to_value(&*branch.components).unwrap_or(Value::Null)
}

pub fn dump_tree(tree: &StateTree, key: &str) -> Value {
    tree.slice::<UiStateBranch>(key)
        .map_or(Value::Null, |b| dump_branch(&b))
}
