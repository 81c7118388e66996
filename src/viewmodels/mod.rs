// ============================================================================
// VIEWMODELS - page state + UI logic, one per screen family
// ============================================================================

pub mod admin;
pub mod auth;
pub mod catalog_admin;
pub mod checkout;
pub mod crypto;
pub mod landing;
pub mod order_history;
pub mod services;

pub use admin::AdminViewModel;
pub use auth::{AuthViewModel, RegisterForm};
pub use catalog_admin::{CatalogAdminViewModel, ManagedItem};
pub use checkout::{CheckoutPhase, CheckoutViewModel};
pub use crypto::CryptoCheckoutViewModel;
pub use landing::{LandingPage, PaymentLandingViewModel};
pub use order_history::{OrderHistoryViewModel, OrderTab};
pub use services::{Purchase, ServicesViewModel};
