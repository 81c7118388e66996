// ============================================================================
// ROUTES - Every page of both front-ends, with path encoding/decoding
// ============================================================================

use std::collections::HashMap;

/// Which front-end a route (and the whole app instance) belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppKind {
    PspFront,
    WebShop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    // PSP
    Checkout { id: String },
    CryptoCheckout { id: String },
    AdminLogin { expired: bool, idle: bool },
    AdminMfa { username: String },
    AdminChangePassword { username: String, first_time: bool },
    AdminDashboard,
    MerchantDetails { id: String },
    PaymentMethods,

    // Web shop
    Home,
    Login { expired: bool, idle: bool },
    Register,
    Mfa { email: String },
    ChangePassword { email: String, first_time: bool },
    Services,
    OrderHistory,
    ManageVehicles,
    ManageEquipment,
    ManageInsurances,
    PaymentSuccess { order_id: Option<String> },
    PaymentFailed { order_id: Option<String> },
    PaymentError { order_id: Option<String> },

    NotFound { path: String },
}

/// Navigation requirement of a route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Only without a valid session (login, register)
    GuestOnly,
    Authenticated,
    AdminOnly,
    /// Signed-in customers; admins are sent home
    UserOnly,
}

fn query(pairs: &[(&str, Option<&str>)]) -> String {
    let encoded: Vec<String> = pairs
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, urlencoding::encode(v))))
        .collect();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}

fn flag(value: bool) -> Option<&'static str> {
    if value {
        Some("true")
    } else {
        None
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(&value.replace('+', " "))
                .map(|v| v.into_owned())
                .ok()?;
            Some((key.to_string(), value))
        })
        .collect()
}

impl Route {
    pub fn to_path(&self) -> String {
        match self {
            Route::Checkout { id } => format!("/checkout/{}", urlencoding::encode(id)),
            Route::CryptoCheckout { id } => format!("/checkout/{}/crypto", urlencoding::encode(id)),
            Route::AdminLogin { expired, idle } => format!(
                "/admin/login{}",
                query(&[("expired", flag(*expired)), ("idle", flag(*idle))])
            ),
            Route::AdminMfa { username } => {
                format!("/admin/mfa{}", query(&[("username", Some(username))]))
            }
            Route::AdminChangePassword { username, first_time } => format!(
                "/admin/change-password{}",
                query(&[("username", Some(username)), ("firstTime", flag(*first_time))])
            ),
            Route::AdminDashboard => "/admin/dashboard".to_string(),
            Route::MerchantDetails { id } => {
                format!("/admin/merchants/{}", urlencoding::encode(id))
            }
            Route::PaymentMethods => "/admin/payment-methods".to_string(),

            Route::Home => "/home".to_string(),
            Route::Login { expired, idle } => format!(
                "/login{}",
                query(&[("expired", flag(*expired)), ("idle", flag(*idle))])
            ),
            Route::Register => "/register".to_string(),
            Route::Mfa { email } => format!("/mfa{}", query(&[("email", Some(email))])),
            Route::ChangePassword { email, first_time } => format!(
                "/change-password{}",
                query(&[("email", Some(email)), ("firstTime", flag(*first_time))])
            ),
            Route::Services => "/services".to_string(),
            Route::OrderHistory => "/order-history".to_string(),
            Route::ManageVehicles => "/vehicles".to_string(),
            Route::ManageEquipment => "/equipment".to_string(),
            Route::ManageInsurances => "/insurance".to_string(),
            Route::PaymentSuccess { order_id } => format!(
                "/payment-success{}",
                query(&[("orderId", order_id.as_deref())])
            ),
            Route::PaymentFailed { order_id } => format!(
                "/payment-failed{}",
                query(&[("orderId", order_id.as_deref())])
            ),
            Route::PaymentError { order_id } => format!(
                "/payment-error{}",
                query(&[("orderId", order_id.as_deref())])
            ),

            Route::NotFound { path } => path.clone(),
        }
    }

    /// Parses a path with an optional query string. Unknown paths become
    /// `NotFound`; the root path is resolved by [`AppKind::resolve`].
    pub fn parse(path_with_query: &str) -> Route {
        let (path, raw_query) = path_with_query
            .split_once('?')
            .unwrap_or((path_with_query, ""));
        let params = parse_query(raw_query);
        let param = |key: &str| params.get(key).cloned().unwrap_or_default();
        let is_true = |key: &str| params.get(key).map(|v| v == "true").unwrap_or(false);
        let order_id = || params.get("orderId").cloned().filter(|v| !v.is_empty());

        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            ["checkout", id] => Route::Checkout { id: id.to_string() },
            ["checkout", id, "crypto"] => Route::CryptoCheckout { id: id.to_string() },
            ["admin", "login"] => Route::AdminLogin {
                expired: is_true("expired"),
                idle: is_true("idle"),
            },
            ["admin", "mfa"] => Route::AdminMfa { username: param("username") },
            ["admin", "change-password"] => Route::AdminChangePassword {
                username: param("username"),
                first_time: is_true("firstTime"),
            },
            ["admin", "dashboard"] => Route::AdminDashboard,
            ["admin", "merchants", id] => Route::MerchantDetails { id: id.to_string() },
            ["admin", "payment-methods"] => Route::PaymentMethods,

            ["home"] => Route::Home,
            ["login"] => Route::Login {
                expired: is_true("expired"),
                idle: is_true("idle"),
            },
            ["register"] => Route::Register,
            ["mfa"] => Route::Mfa { email: param("email") },
            ["change-password"] => Route::ChangePassword {
                email: param("email"),
                first_time: is_true("firstTime"),
            },
            ["services"] => Route::Services,
            ["order-history"] => Route::OrderHistory,
            ["vehicles"] => Route::ManageVehicles,
            ["equipment"] => Route::ManageEquipment,
            ["insurance"] => Route::ManageInsurances,
            ["payment-success"] => Route::PaymentSuccess { order_id: order_id() },
            ["payment-failed"] => Route::PaymentFailed { order_id: order_id() },
            ["payment-error"] => Route::PaymentError { order_id: order_id() },

            _ => Route::NotFound {
                path: path_with_query.to_string(),
            },
        }
    }

    pub fn app(&self) -> Option<AppKind> {
        match self {
            Route::Checkout { .. }
            | Route::CryptoCheckout { .. }
            | Route::AdminLogin { .. }
            | Route::AdminMfa { .. }
            | Route::AdminChangePassword { .. }
            | Route::AdminDashboard
            | Route::MerchantDetails { .. }
            | Route::PaymentMethods => Some(AppKind::PspFront),
            Route::NotFound { .. } => None,
            _ => Some(AppKind::WebShop),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::AdminLogin { .. } | Route::Login { .. } | Route::Register => Access::GuestOnly,
            Route::AdminDashboard | Route::MerchantDetails { .. } | Route::PaymentMethods => {
                Access::Authenticated
            }
            Route::Services | Route::OrderHistory => Access::UserOnly,
            Route::ManageVehicles | Route::ManageEquipment | Route::ManageInsurances => {
                Access::AdminOnly
            }
            _ => Access::Public,
        }
    }

    /// Login pages, where the idle monitor must not run
    pub fn is_login(&self) -> bool {
        matches!(self, Route::AdminLogin { .. } | Route::Login { .. })
    }
}

impl AppKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppKind::PspFront => "psp-front",
            AppKind::WebShop => "web-shop",
        }
    }

    /// Where the root path lands
    pub fn root_route(&self) -> Route {
        match self {
            AppKind::PspFront => Route::Checkout {
                id: "test".to_string(),
            },
            AppKind::WebShop => Route::Register,
        }
    }

    pub fn home_route(&self) -> Route {
        match self {
            AppKind::PspFront => Route::AdminDashboard,
            AppKind::WebShop => Route::Home,
        }
    }

    pub fn login_route(&self, expired: bool, idle: bool) -> Route {
        match self {
            AppKind::PspFront => Route::AdminLogin { expired, idle },
            AppKind::WebShop => Route::Login { expired, idle },
        }
    }

    pub fn mfa_route(&self, account: &str) -> Route {
        match self {
            AppKind::PspFront => Route::AdminMfa {
                username: account.to_string(),
            },
            AppKind::WebShop => Route::Mfa {
                email: account.to_string(),
            },
        }
    }

    pub fn change_password_route(&self, account: &str, first_time: bool) -> Route {
        match self {
            AppKind::PspFront => Route::AdminChangePassword {
                username: account.to_string(),
                first_time,
            },
            AppKind::WebShop => Route::ChangePassword {
                email: account.to_string(),
                first_time,
            },
        }
    }

    /// Resolves a path for this app. Pages of the other front-end are not served.
    pub fn resolve(&self, path_with_query: &str) -> Route {
        let path = path_with_query.split('?').next().unwrap_or_default();
        if path.trim_matches('/').is_empty() {
            return self.root_route();
        }
        let route = Route::parse(path_with_query);
        match route.app() {
            Some(kind) if kind != *self => Route::NotFound {
                path: path_with_query.to_string(),
            },
            _ => route,
        }
    }
}
