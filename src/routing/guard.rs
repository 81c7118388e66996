use crate::routing::route::{Access, AppKind, Route};
use crate::state::SessionStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(Route),
}

/// Decides whether `route` may be shown. Never fails; a refusal is a redirect.
pub fn evaluate(kind: AppKind, route: &Route, session: &SessionStore) -> GuardOutcome {
    let access = route.access();
    if access == Access::Public {
        return GuardOutcome::Allow;
    }

    let valid = session.is_valid();
    let outcome = match access {
        Access::Public => GuardOutcome::Allow,
        Access::GuestOnly if valid => GuardOutcome::Redirect(kind.home_route()),
        Access::GuestOnly => GuardOutcome::Allow,
        _ if !valid => GuardOutcome::Redirect(kind.login_route(false, false)),
        Access::AdminOnly if !session.is_admin() => GuardOutcome::Redirect(kind.home_route()),
        Access::UserOnly if session.is_admin() => GuardOutcome::Redirect(kind.home_route()),
        _ => GuardOutcome::Allow,
    };

    if let GuardOutcome::Redirect(target) = &outcome {
        log::info!("🛡️ {} blocked, redirecting to {}", route.to_path(), target.to_path());
    }
    outcome
}
