pub use crate::effects::{Dispose, Scope, current_scope, disposable_effect, on_unmount};
pub use crate::error::CoreError;
pub use crate::memo::{Memo, SameInput};
pub use crate::props::{Component, Props, component};
pub use crate::runtime::{ComposeGuard, Root, remember, remember_state, remember_with_key};
pub use crate::signal::{Signal, SubId, signal};
pub use crate::store::{Action, Init, StateTree, Store, StoreBuilder};
