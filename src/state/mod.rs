// ============================================================================
// STATE MODULE - Session store + reactive view state (Rc<RefCell>)
// ============================================================================

pub mod notifier;
pub mod reactivity;
pub mod session_store;

pub use notifier::{DomStateNotifier, StateNotifier};
pub use reactivity::ReactiveState;
pub use session_store::{Session, SessionStore};
