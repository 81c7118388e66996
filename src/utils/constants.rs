/// Storage key for the PSP admin bearer token
pub const PSP_TOKEN_KEY: &str = "psp_admin_token";

/// Storage key for the web-shop customer/admin bearer token
pub const WEB_SHOP_TOKEN_KEY: &str = "token";

/// DOM interaction events that count as user activity
pub const ACTIVITY_EVENTS: &[&str] = &["click", "keydown", "mousemove", "scroll", "touchstart"];

/// Event dispatched on `window` after a client-side navigation
pub const ROUTE_CHANGE_EVENT: &str = "routechange";

/// Event dispatched on `window` whenever the current page state may have changed
pub const STATE_CHANGE_EVENT: &str = "statechange";

/// Payment method that is handled on its own page instead of through initiation
pub const CRYPTO_METHOD: &str = "CRYPTO";

/// Currency used for web-shop orders
pub const ORDER_CURRENCY: &str = "EUR";

/// Role claim value for administrators
pub const ADMIN_ROLE: &str = "ADMIN";

/// Backend marker for an idle-timeout 401
pub const INACTIVITY_MARKER: &str = "inactivity";

pub const MFA_REQUIRED_STATUS: &str = "MFA_REQUIRED";

pub const MFA_CODE_LENGTH: usize = 6;

pub const MIN_PASSWORD_LENGTH: usize = 12;

/// The web-shop change-password form only asks for a length
pub const BASIC_MIN_PASSWORD_LENGTH: usize = 8;
