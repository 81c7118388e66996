// ============================================================================
// PAYMENT LANDING - one order-status check after the provider sends us back
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};
use serde::Serialize;

use crate::models::OrderStatus;
use crate::routing::{Navigator, Route};
use crate::services::{OrderService, Scheduler, TimerHandle};
use crate::state::ReactiveState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LandingPage {
    Success,
    Failed,
    Error,
}

impl LandingPage {
    pub fn from_route(route: &Route) -> Option<(LandingPage, Option<String>)> {
        match route {
            Route::PaymentSuccess { order_id } => Some((LandingPage::Success, order_id.clone())),
            Route::PaymentFailed { order_id } => Some((LandingPage::Failed, order_id.clone())),
            Route::PaymentError { order_id } => Some((LandingPage::Error, order_id.clone())),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingState {
    pub page: LandingPage,
    pub order_id: Option<String>,
    pub checking: bool,
    pub status: Option<String>,
    pub confirmed: bool,
    pub message: String,
    pub redirecting_to_success: bool,
}

impl Default for LandingState {
    fn default() -> Self {
        Self {
            page: LandingPage::Success,
            order_id: None,
            checking: false,
            status: None,
            confirmed: false,
            message: String::new(),
            redirecting_to_success: false,
        }
    }
}

const CONFIRMED_MESSAGE: &str = "Your payment was successful and the order is confirmed.";
const LATE_CONFIRMATION_MESSAGE: &str =
    "Your payment was confirmed after all. Taking you to the confirmation page...";
const NO_ORDER_MESSAGE: &str = "No order reference was provided. Check your order history.";
const LOOKUP_FAILED_MESSAGE: &str =
    "Could not check the order status. Please look it up in your order history.";

#[derive(Clone)]
pub struct PaymentLandingViewModel {
    orders: Rc<OrderService>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    redirect_delay: Duration,
    state: ReactiveState<LandingState>,
    lookup: Rc<RefCell<Option<AbortHandle>>>,
    pending_redirect: Rc<RefCell<Option<TimerHandle>>>,
}

impl PaymentLandingViewModel {
    pub fn new(
        orders: Rc<OrderService>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            orders,
            navigator,
            scheduler,
            redirect_delay,
            state: ReactiveState::default(),
            lookup: Rc::new(RefCell::new(None)),
            pending_redirect: Rc::new(RefCell::new(None)),
        }
    }

    pub fn state(&self) -> ReactiveState<LandingState> {
        self.state.clone()
    }

    /// Single status lookup per page load
    pub fn open(&self, page: LandingPage, order_id: Option<String>) {
        self.leave();
        let order_id = order_id.filter(|id| !id.is_empty());
        self.state.set(LandingState {
            page,
            order_id: order_id.clone(),
            checking: order_id.is_some(),
            ..LandingState::default()
        });

        let Some(order_id) = order_id else {
            self.state.update(|s| s.message = NO_ORDER_MESSAGE.to_string());
            return;
        };

        let vm = self.clone();
        let (task, handle) = abortable(async move {
            let result = vm.orders.status(&order_id).await;
            vm.lookup.borrow_mut().take();
            match result {
                Ok(view) => vm.apply_status(page, &order_id, view.order_status),
                Err(e) => {
                    log::error!("❌ Status lookup for {} failed: {}", order_id, e);
                    vm.state.update(|s| {
                        s.checking = false;
                        s.message = LOOKUP_FAILED_MESSAGE.to_string();
                    });
                }
            }
        });
        *self.lookup.borrow_mut() = Some(handle);
        self.scheduler.spawn(Box::pin(async move {
            let _ = task.await;
        }));
    }

    fn apply_status(&self, page: LandingPage, order_id: &str, status: OrderStatus) {
        let confirmed = status.is_confirmed();
        let late_confirmation = confirmed && page != LandingPage::Success;
        let message = if late_confirmation {
            LATE_CONFIRMATION_MESSAGE.to_string()
        } else if confirmed {
            CONFIRMED_MESSAGE.to_string()
        } else {
            format!("Status: {}. Please check your order history.", status.as_str())
        };

        self.state.update(|s| {
            s.checking = false;
            s.status = Some(status.as_str().to_string());
            s.confirmed = confirmed;
            s.message = message;
            s.redirecting_to_success = late_confirmation;
        });

        if late_confirmation {
            log::info!("🔁 Order {} confirmed late, moving to the success page", order_id);
            let navigator = self.navigator.clone();
            let target = Route::PaymentSuccess {
                order_id: Some(order_id.to_string()),
            };
            let handle = self
                .scheduler
                .schedule(self.redirect_delay, Box::new(move || navigator.navigate(target)));
            *self.pending_redirect.borrow_mut() = Some(handle);
        }
    }

    pub fn go_to_order_history(&self) {
        self.leave();
        self.navigator.navigate(Route::OrderHistory);
    }

    /// Drops the in-flight lookup and any scheduled redirect
    pub fn leave(&self) {
        if let Some(handle) = self.lookup.borrow_mut().take() {
            handle.abort();
        }
        self.pending_redirect.borrow_mut().take();
    }
}
