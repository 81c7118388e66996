pub mod admin;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod order;

pub use admin::{
    Merchant, MerchantCreateRequest, MerchantCredentials, MerchantServiceConfig, MethodSelection,
    NewPaymentMethod, PaymentMethodRecord, Subscription,
};
pub use auth::{ChangePasswordForm, LoginOutcome, LoginResponse, RegisterRequest};
pub use catalog::{Equipment, EquipmentType, Insurance, InsuranceType, Vehicle};
pub use checkout::{
    CheckoutTransaction, CryptoDetails, CryptoStatus, InitiationResult, PaymentMethod,
    VerifyQrRequest, VerifyQrResponse,
};
pub use order::{Order, OrderRequest, OrderStatus, OrderStatusView, OrderType};
