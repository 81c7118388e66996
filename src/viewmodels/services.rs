use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use crate::error::ApiError;
use crate::models::{Equipment, Insurance, Order, OrderRequest, Vehicle};
use crate::services::{CatalogItem, CatalogService, OrderService, Scheduler, TimerHandle};
use crate::state::ReactiveState;
use crate::utils::validation;

const SUCCESS_MESSAGE_TTL: Duration = Duration::from_secs(5);
const ORDER_FAILED: &str = "Failed to create order. Please try again.";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesState {
    pub vehicles: Vec<Vehicle>,
    pub equipment: Vec<Equipment>,
    pub insurances: Vec<Insurance>,
    pub loading: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub last_order: Option<Order>,
}

/// What the customer is ordering. Rentals carry the raw date inputs.
#[derive(Clone, Debug, PartialEq)]
pub enum Purchase {
    Vehicle { id: i64, start: String, end: String },
    Equipment { id: i64, start: String, end: String },
    Insurance { id: i64 },
}

impl Purchase {
    pub fn to_request(&self) -> crate::error::Result<OrderRequest> {
        match self {
            Purchase::Vehicle { id, start, end } => {
                let (start, end) = validation::date_range(start, end)?;
                Ok(OrderRequest::vehicle(*id, start, end))
            }
            Purchase::Equipment { id, start, end } => {
                let (start, end) = validation::date_range(start, end)?;
                Ok(OrderRequest::equipment(*id, start, end))
            }
            Purchase::Insurance { id } => Ok(OrderRequest::insurance(*id)),
        }
    }
}

/// Customer-facing catalog and ordering page
#[derive(Clone)]
pub struct ServicesViewModel {
    catalog: Rc<CatalogService>,
    orders: Rc<OrderService>,
    scheduler: Rc<dyn Scheduler>,
    state: ReactiveState<ServicesState>,
    clear_success: Rc<RefCell<Option<TimerHandle>>>,
}

async fn available_or_empty<T: CatalogItem>(catalog: &CatalogService) -> Vec<T> {
    catalog.list_available::<T>().await.unwrap_or_else(|e| {
        log::error!("❌ Error loading {}: {}", T::NAME, e);
        Vec::new()
    })
}

impl ServicesViewModel {
    pub fn new(
        catalog: Rc<CatalogService>,
        orders: Rc<OrderService>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            catalog,
            orders,
            scheduler,
            state: ReactiveState::default(),
            clear_success: Rc::new(RefCell::new(None)),
        }
    }

    pub fn state(&self) -> ReactiveState<ServicesState> {
        self.state.clone()
    }

    /// Loads the three lists concurrently; each one falls back to empty on its own
    pub fn load(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            let catalog = vm.catalog.as_ref();
            let (vehicles, equipment, insurances) = futures::join!(
                available_or_empty::<Vehicle>(catalog),
                available_or_empty::<Equipment>(catalog),
                available_or_empty::<Insurance>(catalog),
            );
            log::info!(
                "🚗 Services loaded: {} vehicles, {} equipment, {} insurances",
                vehicles.len(),
                equipment.len(),
                insurances.len()
            );
            vm.state.update(|s| {
                s.vehicles = vehicles;
                s.equipment = equipment;
                s.insurances = insurances;
                s.loading = false;
            });
        }));
    }

    pub fn order(&self, purchase: Purchase) {
        if self.state.with(|s| s.submitting) {
            return;
        }
        let request = match purchase.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.state.update(|s| {
                    s.error = Some(e.to_string());
                    s.success = None;
                });
                return;
            }
        };

        self.state.update(|s| {
            s.submitting = true;
            s.error = None;
            s.success = None;
        });
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.orders.create(&request).await {
                Ok(order) => {
                    vm.state.update(|s| {
                        s.submitting = false;
                        s.success = Some(format!("Order created successfully! Order ID: {}", order.id));
                        s.last_order = Some(order);
                    });
                    vm.schedule_success_clear();
                }
                Err(e) => {
                    log::error!("❌ Error creating order: {}", e);
                    let message = match &e {
                        ApiError::Network(_) | ApiError::Timeout => ORDER_FAILED.to_string(),
                        other => other
                            .server_message()
                            .map(str::to_string)
                            .unwrap_or_else(|| ORDER_FAILED.to_string()),
                    };
                    vm.state.update(|s| {
                        s.submitting = false;
                        s.error = Some(message);
                    });
                }
            }
        }));
    }

    fn schedule_success_clear(&self) {
        let state = self.state.clone();
        let handle = self.scheduler.schedule(
            SUCCESS_MESSAGE_TTL,
            Box::new(move || state.update(|s| s.success = None)),
        );
        *self.clear_success.borrow_mut() = Some(handle);
    }
}
