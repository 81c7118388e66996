// ============================================================================
// SERVICES - transport seams and stateless REST clients
// ============================================================================

pub mod activity;
pub mod api_client;
pub mod auth_service;
pub mod authorizer;
pub mod catalog_service;
pub mod http;
pub mod idle_monitor;
pub mod merchant_service;
pub mod order_service;
pub mod payment_service;
pub mod scheduler;

pub use activity::{ActivitySource, DocumentActivity};
pub use api_client::ApiClient;
pub use auth_service::AuthService;
pub use authorizer::RequestAuthorizer;
pub use catalog_service::{CatalogItem, CatalogService};
pub use http::{FetchTransport, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use idle_monitor::IdleMonitor;
pub use merchant_service::{MerchantService, PaymentMethodService};
pub use order_service::OrderService;
pub use payment_service::PaymentService;
pub use scheduler::{with_timeout, GlooScheduler, Scheduler, TimerHandle};
