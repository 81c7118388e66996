use std::rc::Rc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::models::Order;
use crate::routing::Navigator;
use crate::services::{OrderService, Scheduler};
use crate::state::ReactiveState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderTab {
    #[default]
    All,
    Active,
    Past,
}

impl OrderTab {
    pub fn parse(raw: &str) -> OrderTab {
        match raw {
            "active" => OrderTab::Active,
            "past" => OrderTab::Past,
            _ => OrderTab::All,
        }
    }
}

/// One row of the history table
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    pub id: i64,
    pub service_name: String,
    pub status: String,
    pub status_label: String,
    pub total_amount: f64,
    pub currency: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub image_url: Option<String>,
    pub resumable_payment: Option<String>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            service_name: order.service_name(),
            status: order.order_status.as_str().to_string(),
            status_label: order.order_status.label().to_string(),
            total_amount: order.total_amount,
            currency: order.currency.clone(),
            start_date: order.start_date.clone(),
            end_date: order.end_date.clone(),
            image_url: order.vehicle_image_url.clone(),
            resumable_payment: order.resumable_payment().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryState {
    pub orders: Vec<Order>,
    pub tab: OrderTab,
    pub loading: bool,
    pub error: Option<String>,
}

impl OrderHistoryState {
    pub fn active(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_active())
    }

    pub fn past(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| !o.is_active())
    }

    /// Rows for the selected tab
    pub fn rows(&self) -> Vec<OrderRow> {
        match self.tab {
            OrderTab::All => self.orders.iter().map(OrderRow::from).collect(),
            OrderTab::Active => self.active().map(OrderRow::from).collect(),
            OrderTab::Past => self.past().map(OrderRow::from).collect(),
        }
    }
}

#[derive(Clone)]
pub struct OrderHistoryViewModel {
    orders: Rc<OrderService>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    config: Rc<AppConfig>,
    state: ReactiveState<OrderHistoryState>,
}

impl OrderHistoryViewModel {
    pub fn new(
        orders: Rc<OrderService>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        config: Rc<AppConfig>,
    ) -> Self {
        Self {
            orders,
            navigator,
            scheduler,
            config,
            state: ReactiveState::default(),
        }
    }

    pub fn state(&self) -> ReactiveState<OrderHistoryState> {
        self.state.clone()
    }

    pub fn load(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.orders.list_mine().await {
                Ok(orders) => {
                    log::info!("📦 {} orders loaded", orders.len());
                    vm.state.update(|s| {
                        s.orders = orders;
                        s.loading = false;
                    });
                }
                Err(e) => {
                    log::error!("❌ Failed to load orders: {}", e);
                    let message = e
                        .server_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| "Failed to load orders. Please try again.".to_string());
                    vm.state.update(|s| {
                        s.loading = false;
                        s.error = Some(message);
                    });
                }
            }
        }));
    }

    pub fn select_tab(&self, tab: OrderTab) {
        self.state.update(|s| s.tab = tab);
    }

    /// Full-page redirect to the PSP checkout of a pending order
    pub fn continue_payment(&self, order_id: i64) {
        let payment = self.state.with(|s| {
            s.orders
                .iter()
                .find(|o| o.id == order_id)
                .and_then(|o| o.resumable_payment().map(str::to_string))
        });
        match payment {
            Some(payment_id) => {
                log::info!("💳 Resuming payment {} for order {}", payment_id, order_id);
                self.navigator
                    .redirect_external(&self.config.checkout_url(&payment_id));
            }
            None => log::warn!("⚠️ Order {} has no payment to resume", order_id),
        }
    }
}
