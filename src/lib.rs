// ============================================================================
// PSP / WEB SHOP CLIENT CORE - wasm entry points
// ============================================================================
// The page shells (templates) call into these exports:
// - start_*: builds the object graph for one front-end
// - on_route_change: guards + idle hook + page load, returns a redirect path
// - page hooks: forward user actions to the view models
// - `statechange` on window: re-read page_state()
// ============================================================================

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod routing;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

#[cfg(test)]
mod testing;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::app::App;
use crate::config::CONFIG;
use crate::models::ChangePasswordForm;
use crate::routing::AppKind;
use crate::viewmodels::{OrderTab, Purchase, RegisterForm};

// Single app instance per page
thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn init_runtime() {
    console_error_panic_hook::set_once();
    if CONFIG.is_logging_enabled() {
        wasm_logger::init(wasm_logger::Config::new(CONFIG.log_level()));
    }
}

fn start(kind: AppKind) {
    init_runtime();
    log::info!("🚀 Starting {} ({})", kind.as_str(), CONFIG.environment);
    let app = App::browser(kind);
    APP.with(|cell| *cell.borrow_mut() = Some(app));
}

fn with_app<R: Default>(action: impl FnOnce(&App) -> R) -> R {
    APP.with(|cell| match cell.borrow().as_ref() {
        Some(app) => action(app),
        None => {
            log::warn!("⚠️ App not started");
            R::default()
        }
    })
}

#[wasm_bindgen]
pub fn start_psp_front() {
    start(AppKind::PspFront);
}

#[wasm_bindgen]
pub fn start_web_shop() {
    start(AppKind::WebShop);
}

/// Returns the path to replace the current one with, or an empty string
#[wasm_bindgen]
pub fn on_route_change(path: &str) -> String {
    with_app(|app| match app.on_route_change(path) {
        (route, true) => route.to_path(),
        (_, false) => String::new(),
    })
}

#[wasm_bindgen]
pub fn logout() {
    with_app(|app| app.logout());
}

/// JSON state of the current page
#[wasm_bindgen]
pub fn page_state() -> String {
    with_app(|app| app.page_state())
}

// ----------------------------------------------------------------------------
// Checkout (PSP)
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn checkout_open(transaction_id: &str) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.checkout.open(transaction_id);
        }
    });
}

#[wasm_bindgen]
pub fn checkout_select(method: &str) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.checkout.select_method(method);
        }
    });
}

#[wasm_bindgen]
pub fn checkout_cancel() {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.checkout.cancel();
        }
    });
}

#[wasm_bindgen]
pub fn checkout_retry() {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.checkout.retry();
        }
    });
}

#[wasm_bindgen]
pub fn checkout_confirm_scan(scanned: &str) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.checkout.confirm_scan(scanned);
        }
    });
}

#[wasm_bindgen]
pub fn checkout_state() -> String {
    with_app(|app| app.psp().map(|psp| psp.checkout.snapshot_json()).unwrap_or_default())
}

#[wasm_bindgen]
pub fn crypto_back() {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.crypto.back();
        }
    });
}

// ----------------------------------------------------------------------------
// Auth (both front-ends)
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn login(identifier: &str, password: &str) {
    with_app(|app| app.auth().login(identifier, password));
}

#[wasm_bindgen]
pub fn verify_mfa(account: &str, code: &str) {
    with_app(|app| app.auth().verify_mfa(account, code));
}

#[wasm_bindgen]
pub fn register(name: &str, surname: &str, email: &str, password: &str, confirm_password: &str) {
    with_app(|app| {
        app.auth().register(&RegisterForm {
            name: name.to_string(),
            surname: surname.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        })
    });
}

#[wasm_bindgen]
pub fn change_password(
    account: &str,
    old_password: Option<String>,
    new_password: &str,
    confirm_password: &str,
    first_time: bool,
) {
    with_app(|app| {
        app.auth().change_password(&ChangePasswordForm {
            account: account.to_string(),
            old_password,
            new_password: new_password.to_string(),
            confirm_password: confirm_password.to_string(),
            first_time,
        })
    });
}

// ----------------------------------------------------------------------------
// Web shop
// ----------------------------------------------------------------------------

/// `kind` is `vehicle`, `equipment` or `insurance`; dates are ignored for insurance
#[wasm_bindgen]
pub fn order_service(kind: &str, id: i64, start: &str, end: &str) {
    let purchase = match kind {
        "vehicle" => Purchase::Vehicle {
            id,
            start: start.to_string(),
            end: end.to_string(),
        },
        "equipment" => Purchase::Equipment {
            id,
            start: start.to_string(),
            end: end.to_string(),
        },
        "insurance" => Purchase::Insurance { id },
        other => {
            log::warn!("⚠️ Unknown service kind {}", other);
            return;
        }
    };
    with_app(|app| {
        if let Some(shop) = app.shop() {
            shop.services.order(purchase);
        }
    });
}

#[wasm_bindgen]
pub fn order_history_tab(tab: &str) {
    with_app(|app| {
        if let Some(shop) = app.shop() {
            shop.orders.select_tab(OrderTab::parse(tab));
        }
    });
}

#[wasm_bindgen]
pub fn continue_payment(order_id: i64) {
    with_app(|app| {
        if let Some(shop) = app.shop() {
            shop.orders.continue_payment(order_id);
        }
    });
}

// ----------------------------------------------------------------------------
// PSP admin
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn admin_create_merchant(name: &str, web_shop_url: &str) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.create_merchant(name, web_shop_url);
        }
    });
}

#[wasm_bindgen]
pub fn admin_toggle_method(method_name: &str, enabled: bool) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.toggle_method(method_name, enabled);
        }
    });
}

#[wasm_bindgen]
pub fn admin_set_credential(method_name: &str, key: &str, value: &str) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.set_credential(method_name, key, value);
        }
    });
}

#[wasm_bindgen]
pub fn admin_save_merchant() {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.save_merchant();
        }
    });
}

#[wasm_bindgen]
pub fn admin_add_method(name: &str, service_url: &str) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.add_method(name, service_url);
        }
    });
}

#[wasm_bindgen]
pub fn admin_delete_method(id: i64) {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.delete_method(id);
        }
    });
}

#[wasm_bindgen]
pub fn admin_dismiss_credentials() {
    with_app(|app| {
        if let Some(psp) = app.psp() {
            psp.admin.dismiss_credentials();
        }
    });
}

// ----------------------------------------------------------------------------
// Web-shop catalog management
// ----------------------------------------------------------------------------

fn parse_item<T: serde::de::DeserializeOwned>(json: &str) -> Option<T> {
    serde_json::from_str(json)
        .map_err(|e| log::error!("❌ Invalid catalog entry: {}", e))
        .ok()
}

/// `resource` is `vehicles`, `equipment` or `insurances`
#[wasm_bindgen]
pub fn catalog_edit(resource: &str, id: i64) {
    with_app(|app| match (app.shop(), resource) {
        (Some(shop), "vehicles") => shop.vehicles.edit(id),
        (Some(shop), "equipment") => shop.equipment.edit(id),
        (Some(shop), "insurances") => shop.insurances.edit(id),
        _ => log::warn!("⚠️ Unknown catalog resource {}", resource),
    });
}

/// Creates the entry when its JSON has no `id`, updates it otherwise
#[wasm_bindgen]
pub fn catalog_save(resource: &str, json: &str) {
    with_app(|app| match (app.shop(), resource) {
        (Some(shop), "vehicles") => {
            if let Some(item) = parse_item(json) {
                shop.vehicles.save(item);
            }
        }
        (Some(shop), "equipment") => {
            if let Some(item) = parse_item(json) {
                shop.equipment.save(item);
            }
        }
        (Some(shop), "insurances") => {
            if let Some(item) = parse_item(json) {
                shop.insurances.save(item);
            }
        }
        _ => log::warn!("⚠️ Unknown catalog resource {}", resource),
    });
}

#[wasm_bindgen]
pub fn catalog_delete(resource: &str, id: i64) {
    with_app(|app| match (app.shop(), resource) {
        (Some(shop), "vehicles") => shop.vehicles.delete(id),
        (Some(shop), "equipment") => shop.equipment.delete(id),
        (Some(shop), "insurances") => shop.insurances.delete(id),
        _ => log::warn!("⚠️ Unknown catalog resource {}", resource),
    });
}

#[wasm_bindgen]
pub fn landing_order_history() {
    with_app(|app| {
        if let Some(shop) = app.shop() {
            shop.landing.go_to_order_history();
        }
    });
}
