// ============================================================================
// REQUEST AUTHORIZER - bearer credential + forced logout on 401
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::{extract_message, Result};
use crate::routing::{AppKind, Navigator};
use crate::services::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::state::SessionStore;
use crate::utils::constants::INACTIVITY_MARKER;

/// Wraps a transport. Responses pass through unchanged so callers still see
/// the 401 after the logout side effect.
pub struct RequestAuthorizer {
    inner: Rc<dyn HttpTransport>,
    session: Rc<SessionStore>,
    navigator: Rc<dyn Navigator>,
    kind: AppKind,
    logout_hooks: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl RequestAuthorizer {
    pub fn new(
        kind: AppKind,
        inner: Rc<dyn HttpTransport>,
        session: Rc<SessionStore>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self {
            inner,
            session,
            navigator,
            kind,
            logout_hooks: RefCell::new(Vec::new()),
        }
    }

    /// Runs after a forced logout, before navigation
    pub fn on_forced_logout(&self, hook: impl Fn() + 'static) {
        self.logout_hooks.borrow_mut().push(Rc::new(hook));
    }

    fn force_logout(&self, body: &str) {
        let idle = extract_message(body)
            .to_lowercase()
            .contains(INACTIVITY_MARKER);
        log::warn!(
            "🔒 401 on an authorized request, logging out ({})",
            if idle { "idle" } else { "expired" }
        );
        self.session.clear();
        let hooks: Vec<Rc<dyn Fn()>> = self.logout_hooks.borrow().clone();
        for hook in hooks {
            hook();
        }
        self.navigator.navigate(self.kind.login_route(true, idle));
    }
}

fn is_login_request(url: &str) -> bool {
    url.contains("/login")
}

impl HttpTransport for RequestAuthorizer {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse>> {
        Box::pin(async move {
            let token = self.session.get_token();
            let attached = token.is_some();
            let request = match token {
                Some(token) => request.header("Authorization", &format!("Bearer {}", token)),
                None => request,
            };
            let login = is_login_request(&request.url);

            let response = self.inner.send(request).await?;
            if response.status == 401 && attached && !login {
                self.force_logout(&response.body);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Route;
    use crate::testing::{RecordingNavigator, ScriptedTransport};
    use crate::utils::MemoryStorage;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::time::Duration;

    struct Fixture {
        authorizer: RequestAuthorizer,
        transport: Rc<ScriptedTransport>,
        navigator: Rc<RecordingNavigator>,
        session: Rc<SessionStore>,
    }

    fn fixture(kind: AppKind, token: Option<&str>) -> Fixture {
        let transport = Rc::new(ScriptedTransport::new());
        let navigator = Rc::new(RecordingNavigator::new());
        let session = Rc::new(SessionStore::new(
            Rc::new(MemoryStorage::new()),
            "token",
            Duration::from_secs(30),
        ));
        if let Some(token) = token {
            session.set_token(token).unwrap();
        }
        let authorizer =
            RequestAuthorizer::new(kind, transport.clone(), session.clone(), navigator.clone());
        Fixture { authorizer, transport, navigator, session }
    }

    #[test]
    fn attaches_bearer_when_token_present() {
        let f = fixture(AppKind::WebShop, Some("t.o.k"));
        f.transport.reply(200, "[]");
        block_on(f.authorizer.send(HttpRequest::get("http://api/orders"))).unwrap();
        assert_eq!(
            f.transport.last_request().unwrap().header_value("Authorization"),
            Some("Bearer t.o.k")
        );
    }

    #[test]
    fn anonymous_requests_have_no_credential() {
        let f = fixture(AppKind::WebShop, None);
        f.transport.reply(401, "nope");
        let response = block_on(f.authorizer.send(HttpRequest::get("http://api/orders"))).unwrap();
        assert_eq!(response.status, 401);
        assert!(f.transport.last_request().unwrap().header_value("Authorization").is_none());
        assert!(f.navigator.routes().is_empty());
    }

    #[test]
    fn expired_401_logs_out_and_passes_response_through() {
        let f = fixture(AppKind::WebShop, Some("t.o.k"));
        let hook_runs = Rc::new(Cell::new(0));
        let counter = hook_runs.clone();
        f.authorizer.on_forced_logout(move || counter.set(counter.get() + 1));
        f.transport.reply(401, r#"{"message":"Token expired"}"#);

        let response = block_on(f.authorizer.send(HttpRequest::get("http://api/orders"))).unwrap();
        assert_eq!(response.status, 401);
        assert!(!f.session.has_token());
        assert_eq!(hook_runs.get(), 1);
        assert_eq!(f.navigator.routes(), vec![Route::Login { expired: true, idle: false }]);
    }

    #[test]
    fn inactivity_401_carries_idle_flag() {
        let f = fixture(AppKind::PspFront, Some("t.o.k"));
        f.transport
            .reply(401, r#"{"message":"Session expired due to inactivity"}"#);
        block_on(f.authorizer.send(HttpRequest::get("http://api/api/merchants"))).unwrap();
        assert_eq!(
            f.navigator.routes(),
            vec![Route::AdminLogin { expired: true, idle: true }]
        );
    }

    #[test]
    fn login_401_is_left_to_the_caller() {
        let f = fixture(AppKind::PspFront, Some("t.o.k"));
        f.transport.reply(401, "Wrong credentials");
        block_on(f.authorizer.send(HttpRequest::post("http://api/api/admin/login"))).unwrap();
        assert!(f.session.has_token());
        assert!(f.navigator.routes().is_empty());
    }
}
