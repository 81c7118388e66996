// ============================================================================
// APP - composition root for one front-end
// ============================================================================
// storage -> SessionStore -> transport wrapped by RequestAuthorizer -> services
// -> idle monitor -> view models. Nothing below this file reaches for a
// global; everything is handed in here.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{AppConfig, CONFIG};
use crate::models::{Equipment, Insurance, Vehicle};
use crate::routing::{evaluate, AppKind, BrowserNavigator, GuardOutcome, Navigator, Route};
use crate::services::{
    ActivitySource, ApiClient, AuthService, CatalogService, DocumentActivity, FetchTransport,
    GlooScheduler, HttpTransport, IdleMonitor, MerchantService, OrderService, PaymentMethodService,
    PaymentService, RequestAuthorizer, Scheduler,
};
use crate::state::notifier::forward;
use crate::state::{DomStateNotifier, SessionStore, StateNotifier};
use crate::utils::{BrowserStorage, KeyValueStore};
use crate::viewmodels::{
    AdminViewModel, AuthViewModel, CatalogAdminViewModel, CheckoutViewModel,
    CryptoCheckoutViewModel, LandingPage, OrderHistoryViewModel, PaymentLandingViewModel,
    ServicesViewModel,
};

/// Platform pieces injected into the graph
pub struct Platform {
    pub storage: Rc<dyn KeyValueStore>,
    pub transport: Rc<dyn HttpTransport>,
    pub navigator: Rc<dyn Navigator>,
    pub scheduler: Rc<dyn Scheduler>,
    pub activity: Rc<dyn ActivitySource>,
    pub notifier: Rc<dyn StateNotifier>,
}

impl Platform {
    pub fn browser() -> Self {
        Self {
            storage: Rc::new(BrowserStorage),
            transport: Rc::new(FetchTransport),
            navigator: Rc::new(BrowserNavigator),
            scheduler: Rc::new(GlooScheduler),
            activity: Rc::new(DocumentActivity::new()),
            notifier: Rc::new(DomStateNotifier),
        }
    }
}

/// PSP pages: checkout and the admin console
pub struct PspPages {
    pub checkout: CheckoutViewModel,
    pub crypto: CryptoCheckoutViewModel,
    pub admin: AdminViewModel,
}

/// Web-shop pages
pub struct ShopPages {
    pub services: ServicesViewModel,
    pub orders: OrderHistoryViewModel,
    pub landing: PaymentLandingViewModel,
    pub vehicles: CatalogAdminViewModel<Vehicle>,
    pub equipment: CatalogAdminViewModel<Equipment>,
    pub insurances: CatalogAdminViewModel<Insurance>,
}

pub enum Pages {
    Psp(PspPages),
    Shop(ShopPages),
}

pub struct App {
    kind: AppKind,
    session: Rc<SessionStore>,
    idle: IdleMonitor,
    auth: AuthViewModel,
    pages: Pages,
    current: RefCell<Option<Route>>,
}

impl App {
    pub fn browser(kind: AppKind) -> Self {
        Self::new(kind, Rc::new(CONFIG.clone()), Platform::browser())
    }

    pub fn new(kind: AppKind, config: Rc<AppConfig>, platform: Platform) -> Self {
        let Platform {
            storage,
            transport,
            navigator,
            scheduler,
            activity,
            notifier,
        } = platform;

        let session = Rc::new(SessionStore::new(
            storage,
            SessionStore::token_key_for(kind),
            config.clock_skew(),
        ));
        let authorizer = Rc::new(RequestAuthorizer::new(
            kind,
            transport,
            session.clone(),
            navigator.clone(),
        ));
        let client = ApiClient::new(config.api_base_url(), authorizer.clone());

        let idle = IdleMonitor::new(
            kind,
            config.idle_timeout(),
            session.clone(),
            navigator.clone(),
            scheduler.clone(),
            activity,
        );
        let forced = idle.clone();
        authorizer.on_forced_logout(move || forced.stop_watching());

        let auth = AuthViewModel::new(
            kind,
            Rc::new(AuthService::new(kind, client.clone(), session.clone())),
            idle.clone(),
            navigator.clone(),
            scheduler.clone(),
            config.redirect_delay(),
        );

        let pages = match kind {
            AppKind::PspFront => {
                let payments = Rc::new(PaymentService::new(client.clone()));
                Pages::Psp(PspPages {
                    checkout: CheckoutViewModel::new(
                        payments.clone(),
                        navigator.clone(),
                        scheduler.clone(),
                        config.network_timeout(),
                    ),
                    crypto: CryptoCheckoutViewModel::new(
                        payments,
                        navigator.clone(),
                        scheduler.clone(),
                        config.crypto_poll_interval(),
                    ),
                    admin: AdminViewModel::new(
                        Rc::new(MerchantService::new(client.clone())),
                        Rc::new(PaymentMethodService::new(client)),
                        navigator.clone(),
                        scheduler,
                    ),
                })
            }
            AppKind::WebShop => {
                let catalog = Rc::new(CatalogService::new(client.clone()));
                let orders = Rc::new(OrderService::new(client));
                let delay = config.redirect_delay();
                Pages::Shop(ShopPages {
                    services: ServicesViewModel::new(catalog.clone(), orders.clone(), scheduler.clone()),
                    orders: OrderHistoryViewModel::new(
                        orders.clone(),
                        navigator.clone(),
                        scheduler.clone(),
                        config.clone(),
                    ),
                    landing: PaymentLandingViewModel::new(
                        orders,
                        navigator.clone(),
                        scheduler.clone(),
                        delay,
                    ),
                    vehicles: CatalogAdminViewModel::new(
                        catalog.clone(),
                        navigator.clone(),
                        scheduler.clone(),
                        delay,
                    ),
                    equipment: CatalogAdminViewModel::new(
                        catalog.clone(),
                        navigator.clone(),
                        scheduler.clone(),
                        delay,
                    ),
                    insurances: CatalogAdminViewModel::new(catalog, navigator.clone(), scheduler, delay),
                })
            }
        };

        forward(&auth.state(), &notifier);
        match &pages {
            Pages::Psp(p) => {
                forward(&p.checkout.state(), &notifier);
                forward(&p.crypto.state(), &notifier);
                forward(&p.admin.state(), &notifier);
            }
            Pages::Shop(s) => {
                forward(&s.services.state(), &notifier);
                forward(&s.orders.state(), &notifier);
                forward(&s.landing.state(), &notifier);
                forward(&s.vehicles.state(), &notifier);
                forward(&s.equipment.state(), &notifier);
                forward(&s.insurances.state(), &notifier);
            }
        }

        log::info!("🚀 {} ready (API {})", kind.as_str(), config.api_base_url());
        Self {
            kind,
            session,
            idle,
            auth,
            pages,
            current: RefCell::new(None),
        }
    }

    pub fn kind(&self) -> AppKind {
        self.kind
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn auth(&self) -> &AuthViewModel {
        &self.auth
    }

    pub fn psp(&self) -> Option<&PspPages> {
        match &self.pages {
            Pages::Psp(pages) => Some(pages),
            Pages::Shop(_) => None,
        }
    }

    pub fn shop(&self) -> Option<&ShopPages> {
        match &self.pages {
            Pages::Shop(pages) => Some(pages),
            Pages::Psp(_) => None,
        }
    }

    pub fn current_route(&self) -> Option<Route> {
        self.current.borrow().clone()
    }

    /// Runs the guard for `path`, updates the idle monitor and loads the page.
    /// Returns the route that ends up displayed and whether it was a redirect.
    pub fn on_route_change(&self, path: &str) -> (Route, bool) {
        let requested = self.kind.resolve(path);
        let (route, redirected) = match evaluate(self.kind, &requested, &self.session) {
            GuardOutcome::Allow => (requested, false),
            GuardOutcome::Redirect(target) => (target, true),
        };

        if self.session.has_token() && !route.is_login() {
            self.idle.start_watching();
        } else {
            self.idle.stop_watching();
        }

        let previous = self.current.replace(Some(route.clone()));
        if previous.as_ref() != Some(&route) {
            if let Some(previous) = previous {
                self.leave(&previous);
            }
            self.enter(&route);
        }
        (route, redirected)
    }

    fn enter(&self, route: &Route) {
        match (&self.pages, route) {
            (Pages::Psp(p), Route::CryptoCheckout { id }) => p.crypto.open(id),
            (Pages::Psp(p), Route::AdminDashboard) => p.admin.load_merchants(),
            (Pages::Psp(p), Route::MerchantDetails { id }) => p.admin.open_merchant(id),
            (Pages::Psp(p), Route::PaymentMethods) => p.admin.load_methods(),
            (Pages::Shop(s), Route::Services) => s.services.load(),
            (Pages::Shop(s), Route::OrderHistory) => s.orders.load(),
            (Pages::Shop(s), Route::ManageVehicles) => s.vehicles.load(),
            (Pages::Shop(s), Route::ManageEquipment) => s.equipment.load(),
            (Pages::Shop(s), Route::ManageInsurances) => s.insurances.load(),
            (Pages::Shop(s), landing) => {
                if let Some((page, order_id)) = LandingPage::from_route(landing) {
                    s.landing.open(page, order_id);
                }
            }
            _ => {}
        }
    }

    fn leave(&self, route: &Route) {
        match (&self.pages, route) {
            (Pages::Psp(p), Route::CryptoCheckout { .. }) => p.crypto.stop(),
            (Pages::Psp(p), Route::Checkout { .. }) => p.checkout.cancel(),
            (Pages::Shop(s), Route::PaymentSuccess { .. })
            | (Pages::Shop(s), Route::PaymentFailed { .. })
            | (Pages::Shop(s), Route::PaymentError { .. }) => s.landing.leave(),
            _ => {}
        }
        self.auth.leave();
    }

    pub fn logout(&self) {
        self.auth.logout();
    }

    /// JSON snapshot of whatever the current page renders
    pub fn page_state(&self) -> String {
        let route = self.current_route();
        let json = match (&self.pages, route.as_ref()) {
            (Pages::Psp(p), Some(Route::Checkout { .. })) => return p.checkout.snapshot_json(),
            (Pages::Psp(p), Some(Route::CryptoCheckout { .. })) => p.crypto.state().with(serde_json::to_string),
            (
                Pages::Psp(p),
                Some(Route::AdminDashboard | Route::MerchantDetails { .. } | Route::PaymentMethods),
            ) => p.admin.state().with(serde_json::to_string),
            (Pages::Shop(s), Some(Route::Services)) => s.services.state().with(serde_json::to_string),
            (Pages::Shop(s), Some(Route::OrderHistory)) => s.orders.state().with(|state| {
                serde_json::to_string(&serde_json::json!({
                    "tab": state.tab,
                    "loading": state.loading,
                    "error": state.error,
                    "rows": state.rows(),
                }))
            }),
            (Pages::Shop(s), Some(Route::ManageVehicles)) => s.vehicles.state().with(serde_json::to_string),
            (Pages::Shop(s), Some(Route::ManageEquipment)) => s.equipment.state().with(serde_json::to_string),
            (Pages::Shop(s), Some(Route::ManageInsurances)) => s.insurances.state().with(serde_json::to_string),
            (
                Pages::Shop(s),
                Some(Route::PaymentSuccess { .. } | Route::PaymentFailed { .. } | Route::PaymentError { .. }),
            ) => s.landing.state().with(serde_json::to_string),
            _ => self.auth.state().with(serde_json::to_string),
        };
        json.unwrap_or_else(|e| {
            log::error!("❌ Page state not serializable: {}", e);
            "{}".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        CountingNotifier, FakeScheduler, ManualActivity, RecordingNavigator, ScriptedTransport,
    };
    use crate::utils::jwt::encode_test_token;
    use crate::utils::MemoryStorage;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        app: App,
        storage: Rc<MemoryStorage>,
        transport: Rc<ScriptedTransport>,
        navigator: Rc<RecordingNavigator>,
        scheduler: Rc<FakeScheduler>,
        activity: Rc<ManualActivity>,
        notifier: Rc<CountingNotifier>,
    }

    fn fixture(kind: AppKind) -> Fixture {
        let storage = Rc::new(MemoryStorage::new());
        let transport = Rc::new(ScriptedTransport::new());
        let navigator = Rc::new(RecordingNavigator::new());
        let scheduler = Rc::new(FakeScheduler::new());
        let activity = Rc::new(ManualActivity::new());
        let notifier = Rc::new(CountingNotifier::new());
        let app = App::new(
            kind,
            Rc::new(AppConfig::default()),
            Platform {
                storage: storage.clone(),
                transport: transport.clone(),
                navigator: navigator.clone(),
                scheduler: scheduler.clone(),
                activity: activity.clone(),
                notifier: notifier.clone(),
            },
        );
        Fixture { app, storage, transport, navigator, scheduler, activity, notifier }
    }

    fn sign_in(f: &Fixture, role: &str) {
        let token = encode_test_token(&json!({"exp": 4_102_444_800i64, "role": role}));
        f.app.session().set_token(&token).unwrap();
    }

    #[test]
    fn guest_on_dashboard_is_redirected_to_login() {
        let f = fixture(AppKind::PspFront);
        let (route, redirected) = f.app.on_route_change("/admin/dashboard");
        assert!(redirected);
        assert_eq!(route, Route::AdminLogin { expired: false, idle: false });
        assert_eq!(f.activity.attach_calls(), 0);
    }

    #[test]
    fn protected_page_with_token_starts_idle_once() {
        let f = fixture(AppKind::WebShop);
        sign_in(&f, "USER");
        f.transport.reply(200, "[]");
        f.app.on_route_change("/order-history");
        f.app.on_route_change("/services");
        assert_eq!(f.activity.attach_calls(), 1);

        f.app.session().clear();
        f.app.on_route_change("/login");
        assert_eq!(f.activity.attached_listeners(), 0);
    }

    #[test]
    fn forced_logout_stops_idle_monitor() {
        let f = fixture(AppKind::WebShop);
        sign_in(&f, "USER");
        f.transport.reply(200, "[]");
        f.app.on_route_change("/order-history");
        f.scheduler.run_until_stalled();
        assert_eq!(f.activity.attached_listeners(), 5);

        f.transport.reply(401, r#"{"message":"Session expired due to inactivity"}"#);
        f.app.shop().unwrap().orders.load();
        f.scheduler.run_until_stalled();

        assert_eq!(f.activity.attached_listeners(), 0);
        assert!(f.storage.is_empty());
        assert_eq!(
            f.navigator.routes(),
            vec![Route::Login { expired: true, idle: true }]
        );
    }

    #[test]
    fn idle_timeout_logs_out_after_fifteen_minutes() {
        let f = fixture(AppKind::PspFront);
        sign_in(&f, "ADMIN");
        f.transport.reply(200, "[]");
        f.app.on_route_change("/admin/dashboard");
        f.scheduler.advance(Duration::from_secs(15 * 60));
        assert_eq!(
            f.navigator.routes(),
            vec![Route::AdminLogin { expired: false, idle: true }]
        );
        assert!(!f.app.session().has_token());
    }

    #[test]
    fn other_app_pages_are_not_found() {
        let f = fixture(AppKind::WebShop);
        let (route, _) = f.app.on_route_change("/admin/dashboard");
        assert!(matches!(route, Route::NotFound { .. }));
    }

    #[test]
    fn checkout_page_state_is_exposed() {
        let f = fixture(AppKind::PspFront);
        f.app.on_route_change("/checkout/tx-1");
        let psp = f.app.psp().unwrap();
        f.transport.reply(200, r#"{"amount":10,"currency":"EUR","availableMethods":["CARD"]}"#);
        psp.checkout.open("tx-1");
        f.scheduler.run_until_stalled();

        assert!(f.notifier.changes() >= 2);
        let state: serde_json::Value = serde_json::from_str(&f.app.page_state()).unwrap();
        assert_eq!(state["phase"]["phase"], "ready");
        assert_eq!(state["transaction"]["availableMethods"][0]["name"], "CARD");
    }

    #[test]
    fn async_results_notify_the_page_shell() {
        let f = fixture(AppKind::WebShop);
        sign_in(&f, "USER");
        let pending = f.transport.reply_later();
        f.app.on_route_change("/order-history");
        f.scheduler.run_until_stalled();
        let before = f.notifier.changes();

        let _ = pending.send(Ok(crate::services::HttpResponse::new(200, "[]")));
        f.scheduler.run_until_stalled();
        assert!(f.notifier.changes() > before);
    }
}
