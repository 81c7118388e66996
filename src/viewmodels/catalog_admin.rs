use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use crate::error::ApiError;
use crate::models::{Equipment, Insurance, Vehicle};
use crate::routing::{Navigator, Route};
use crate::services::{CatalogItem, CatalogService, Scheduler, TimerHandle};
use crate::state::ReactiveState;

/// Catalog entries an administrator can manage from a list page
pub trait ManagedItem: CatalogItem + Clone + PartialEq + 'static {
    fn list_route() -> Route;
}

impl ManagedItem for Vehicle {
    fn list_route() -> Route {
        Route::ManageVehicles
    }
}

impl ManagedItem for Equipment {
    fn list_route() -> Route {
        Route::ManageEquipment
    }
}

impl ManagedItem for Insurance {
    fn list_route() -> Route {
        Route::ManageInsurances
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAdminState<T> {
    pub items: Vec<T>,
    pub editing: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl<T> Default for CatalogAdminState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            editing: None,
            loading: false,
            error: None,
            success: None,
        }
    }
}

fn load_error(error: &ApiError, name: &str) -> String {
    match error {
        ApiError::Unauthorized { .. } => "Unauthorized. Please log in again.".to_string(),
        ApiError::Forbidden { .. } => "Access denied. Admin role required.".to_string(),
        other => other
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Failed to load {}. Please try again.", name)),
    }
}

/// List, edit and delete page for one catalog resource (web-shop admin)
pub struct CatalogAdminViewModel<T: ManagedItem> {
    catalog: Rc<CatalogService>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    redirect_delay: Duration,
    state: ReactiveState<CatalogAdminState<T>>,
    pending_redirect: Rc<RefCell<Option<TimerHandle>>>,
    _item: PhantomData<T>,
}

impl<T: ManagedItem> Clone for CatalogAdminViewModel<T> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            navigator: self.navigator.clone(),
            scheduler: self.scheduler.clone(),
            redirect_delay: self.redirect_delay,
            state: self.state.clone(),
            pending_redirect: self.pending_redirect.clone(),
            _item: PhantomData,
        }
    }
}

impl<T: ManagedItem> CatalogAdminViewModel<T> {
    pub fn new(
        catalog: Rc<CatalogService>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            navigator,
            scheduler,
            redirect_delay,
            state: ReactiveState::default(),
            pending_redirect: Rc::new(RefCell::new(None)),
            _item: PhantomData,
        }
    }

    pub fn state(&self) -> ReactiveState<CatalogAdminState<T>> {
        self.state.clone()
    }

    pub fn load(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.catalog.list::<T>().await {
                Ok(items) => vm.state.update(|s| {
                    s.items = items;
                    s.loading = false;
                }),
                Err(e) => {
                    log::error!("❌ Error loading {}: {}", T::NAME, e);
                    vm.state.update(|s| {
                        s.loading = false;
                        s.error = Some(load_error(&e, T::NAME));
                    });
                }
            }
        }));
    }

    /// Loads one entry into the edit form
    pub fn edit(&self, id: i64) {
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.catalog.get::<T>(id).await {
                Ok(item) => vm.state.update(|s| s.editing = Some(item)),
                Err(e) => vm.state.update(|s| s.error = Some(load_error(&e, T::NAME))),
            }
        }));
    }

    /// Creates or updates depending on whether the item has an id, then
    /// returns to the list after a short delay
    pub fn save(&self, item: T) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
            s.success = None;
        });
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            let result = match item.id() {
                Some(id) => vm.catalog.update(id, &item).await,
                None => vm.catalog.create(&item).await,
            };
            match result {
                Ok(_) => {
                    let verb = if item.id().is_some() { "updated" } else { "created" };
                    vm.state.update(|s| {
                        s.loading = false;
                        s.success = Some(format!("Saved: {} {}.", T::NAME, verb));
                    });
                    let list = vm.clone();
                    let handle = vm.scheduler.schedule(
                        vm.redirect_delay,
                        Box::new(move || list.back_to_list()),
                    );
                    *vm.pending_redirect.borrow_mut() = Some(handle);
                }
                Err(e) => {
                    log::error!("❌ Error saving {}: {}", T::NAME, e);
                    vm.state.update(|s| {
                        s.loading = false;
                        s.error = Some(
                            e.server_message()
                                .map(str::to_string)
                                .unwrap_or_else(|| format!("Failed to save {}.", T::NAME)),
                        );
                    });
                }
            }
        }));
    }

    /// The list route is usually already showing, so the reload happens here
    fn back_to_list(&self) {
        self.state.update(|s| {
            s.editing = None;
            s.success = None;
        });
        self.navigator.navigate(T::list_route());
        self.load();
    }

    /// Deletes and reloads the list
    pub fn delete(&self, id: i64) {
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.catalog.delete::<T>(id).await {
                Ok(_) => vm.load(),
                Err(e) => {
                    log::error!("❌ Error deleting {} {}: {}", T::NAME, id, e);
                    vm.state.update(|s| {
                        s.error = Some(format!("Failed to delete {}. Please try again.", T::NAME))
                    });
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentType, InsuranceType};
    use crate::services::{ApiClient, HttpMethod};
    use crate::testing::{FakeScheduler, RecordingNavigator, ScriptedTransport};

    fn fixture<T: ManagedItem>() -> (
        CatalogAdminViewModel<T>,
        Rc<ScriptedTransport>,
        Rc<RecordingNavigator>,
        Rc<FakeScheduler>,
    ) {
        let transport = Rc::new(ScriptedTransport::new());
        let navigator = Rc::new(RecordingNavigator::new());
        let scheduler = Rc::new(FakeScheduler::new());
        let vm = CatalogAdminViewModel::new(
            Rc::new(CatalogService::new(ApiClient::new("http://shop", transport.clone()))),
            navigator.clone(),
            scheduler.clone(),
            Duration::from_millis(1500),
        );
        (vm, transport, navigator, scheduler)
    }

    #[test]
    fn forbidden_list_shows_role_message() {
        let (vm, transport, _, scheduler) = fixture::<Vehicle>();
        transport.reply(403, "");
        vm.load();
        scheduler.run_until_stalled();
        assert_eq!(
            vm.state().get().error.as_deref(),
            Some("Access denied. Admin role required.")
        );
    }

    #[test]
    fn saving_existing_item_updates_then_returns_to_list() {
        let (vm, transport, navigator, scheduler) = fixture::<Equipment>();
        transport.reply(200, r#"{"id":4,"pricePerDay":5,"equipmentType":"GPS","isAvailable":true}"#);
        vm.save(Equipment {
            id: Some(4),
            price_per_day: 5.0,
            equipment_type: EquipmentType::Gps,
            available: None,
            is_available: Some(true),
        });
        scheduler.run_until_stalled();
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.url, "http://shop/equipment/4");
        assert!(navigator.routes().is_empty());

        transport.reply(200, r#"[{"id":4,"pricePerDay":5,"equipmentType":"GPS","isAvailable":true}]"#);
        scheduler.advance(Duration::from_millis(1500));
        assert_eq!(navigator.routes(), vec![Route::ManageEquipment]);
        assert_eq!(transport.request_count(), 2);
        let reload = transport.last_request().unwrap();
        assert_eq!(reload.method, HttpMethod::Get);
        assert_eq!(reload.url, "http://shop/equipment");
        let state = vm.state().get();
        assert_eq!(state.items.len(), 1);
        assert!(state.editing.is_none());
    }

    #[test]
    fn created_item_appears_after_save() {
        let (vm, transport, _, scheduler) = fixture::<Insurance>();
        transport.reply(200, "[]");
        vm.load();
        scheduler.run_until_stalled();
        assert!(vm.state().get().items.is_empty());

        transport.reply(200, r#"{"id":7,"price":20,"type":"FULL"}"#);
        vm.save(Insurance {
            id: None,
            price: 20.0,
            insurance_type: InsuranceType::Full,
            available: None,
            is_available: None,
        });
        scheduler.run_until_stalled();
        assert_eq!(transport.last_request().unwrap().method, HttpMethod::Post);

        transport.reply(200, r#"[{"id":7,"price":20,"type":"FULL"}]"#);
        scheduler.advance(Duration::from_millis(1500));
        assert_eq!(vm.state().get().items.len(), 1);
    }

    #[test]
    fn delete_reloads_list() {
        let (vm, transport, _, scheduler) = fixture::<Insurance>();
        transport.reply(200, "Insurance deleted");
        transport.reply(200, r#"[{"id":1,"price":10,"type":"BASIC"}]"#);
        vm.delete(2);
        scheduler.run_until_stalled();
        assert_eq!(transport.request_count(), 2);
        assert_eq!(vm.state().get().items.len(), 1);
    }
}
