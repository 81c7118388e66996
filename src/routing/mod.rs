// ============================================================================
// ROUTING - Route table, guards and navigation
// ============================================================================

pub mod guard;
pub mod navigator;
pub mod route;

pub use guard::{evaluate, GuardOutcome};
pub use navigator::{BrowserNavigator, Navigator};
pub use route::{Access, AppKind, Route};
