use wasm_bindgen::JsValue;
use web_sys::{window, Event};

use crate::routing::route::Route;
use crate::utils::constants::ROUTE_CHANGE_EVENT;

/// In-app navigation and full-page redirects
pub trait Navigator {
    fn navigate(&self, route: Route);
    fn redirect_external(&self, url: &str);
}

/// History API navigation. The page shell listens for `routechange` and renders.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, route: Route) {
        let path = route.to_path();
        let Some(window) = window() else {
            log::error!("❌ No window available, cannot navigate to {}", path);
            return;
        };

        match window.history() {
            Ok(history) => {
                if let Err(e) = history.push_state_with_url(&JsValue::NULL, "", Some(&path)) {
                    log::error!("❌ pushState failed for {}: {:?}", path, e);
                    return;
                }
            }
            Err(e) => {
                log::error!("❌ History API unavailable: {:?}", e);
                return;
            }
        }

        log::info!("🧭 Navigated to {}", path);
        match Event::new(ROUTE_CHANGE_EVENT) {
            Ok(event) => {
                let _ = window.dispatch_event(&event);
            }
            Err(e) => log::error!("❌ Could not create {} event: {:?}", ROUTE_CHANGE_EVENT, e),
        }
    }

    fn redirect_external(&self, url: &str) {
        log::info!("↗️ Redirecting to {}", url);
        if let Some(window) = window() {
            if let Err(e) = window.location().set_href(url) {
                log::error!("❌ Redirect to {} failed: {:?}", url, e);
            }
        }
    }
}
