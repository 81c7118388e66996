// ============================================================================
// ADMIN VIEWMODEL - PSP dashboard, merchant details, payment methods
// ============================================================================

use std::rc::Rc;

use serde::Serialize;

use crate::error::Result;
use crate::models::admin::{build_selections, configs_to_save};
use crate::models::{
    Merchant, MerchantCreateRequest, MerchantCredentials, MethodSelection, NewPaymentMethod,
    PaymentMethodRecord,
};
use crate::routing::{Navigator, Route};
use crate::services::{MerchantService, PaymentMethodService, Scheduler};
use crate::state::ReactiveState;
use crate::utils::validation;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminState {
    pub merchants: Vec<Merchant>,
    /// Shown once, right after creation
    pub created_credentials: Option<MerchantCredentials>,
    pub merchant: Option<Merchant>,
    pub selections: Vec<MethodSelection>,
    pub methods: Vec<PaymentMethodRecord>,
    pub busy: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Clone)]
pub struct AdminViewModel {
    merchants: Rc<MerchantService>,
    methods: Rc<PaymentMethodService>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    state: ReactiveState<AdminState>,
}

impl AdminViewModel {
    pub fn new(
        merchants: Rc<MerchantService>,
        methods: Rc<PaymentMethodService>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            merchants,
            methods,
            navigator,
            scheduler,
            state: ReactiveState::default(),
        }
    }

    pub fn state(&self) -> ReactiveState<AdminState> {
        self.state.clone()
    }

    fn fail(&self, context: &str, error: crate::error::ApiError) {
        log::error!("❌ {}: {}", context, error);
        let message = error
            .server_message()
            .map(|m| format!("{}: {}", context, m))
            .unwrap_or_else(|| format!("{}.", context));
        self.state.update(|s| {
            s.busy = false;
            s.error = Some(message);
        });
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    pub fn load_merchants(&self) {
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.merchants.list().await {
                Ok(merchants) => vm.state.update(|s| s.merchants = merchants),
                Err(e) => vm.fail("Could not load merchants", e),
            }
        }));
    }

    pub fn create_merchant(&self, name: &str, web_shop_url: &str) {
        if let Err(e) = validation::required("Name", name)
            .and_then(|_| validation::required("Web shop URL", web_shop_url))
        {
            self.state.update(|s| s.error = Some(e.to_string()));
            return;
        }
        let request = MerchantCreateRequest {
            name: name.trim().to_string(),
            web_shop_url: web_shop_url.trim().to_string(),
        };
        self.state.update(|s| {
            s.busy = true;
            s.error = None;
            s.created_credentials = None;
        });

        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.merchants.create(&request).await {
                Ok(credentials) => vm.state.update(|s| {
                    s.merchants.push(Merchant {
                        merchant_id: credentials.merchant_id.clone(),
                        name: request.name.clone(),
                        web_shop_url: Some(request.web_shop_url.clone()),
                    });
                    s.created_credentials = Some(credentials);
                    s.busy = false;
                }),
                Err(e) => vm.fail("Could not create the merchant", e),
            }
        }));
    }

    /// Forgets the one-time credentials
    pub fn dismiss_credentials(&self) {
        self.state.update(|s| s.created_credentials = None);
    }

    // ------------------------------------------------------------------
    // Merchant details
    // ------------------------------------------------------------------

    /// Loads methods, merchant and subscriptions together; any failure fails the page
    pub fn open_merchant(&self, merchant_id: &str) {
        self.state.update(|s| {
            s.busy = true;
            s.error = None;
            s.merchant = None;
            s.selections.clear();
        });
        let vm = self.clone();
        let id = merchant_id.to_string();
        self.scheduler.spawn(Box::pin(async move {
            let loaded: Result<_> = futures::future::try_join3(
                vm.methods.list(),
                vm.merchants.get(&id),
                vm.merchants.subscriptions(&id),
            )
            .await;
            match loaded {
                Ok((methods, merchant, subscriptions)) => {
                    let selections = build_selections(&methods, &subscriptions);
                    log::info!(
                        "🏪 {}: {} of {} methods enabled",
                        id,
                        selections.iter().filter(|s| s.enabled).count(),
                        selections.len()
                    );
                    vm.state.update(|s| {
                        s.methods = methods;
                        s.merchant = Some(merchant);
                        s.selections = selections;
                        s.busy = false;
                    });
                }
                Err(e) => vm.fail("Could not load the merchant", e),
            }
        }));
    }

    pub fn toggle_method(&self, method_name: &str, enabled: bool) {
        self.state.update(|s| {
            if let Some(selection) = s.selections.iter_mut().find(|x| x.method_name == method_name) {
                selection.enabled = enabled;
            }
        });
    }

    pub fn set_credential(&self, method_name: &str, key: &str, value: &str) {
        self.state.update(|s| {
            if let Some(selection) = s.selections.iter_mut().find(|x| x.method_name == method_name) {
                if value.is_empty() {
                    selection.credentials.remove(key);
                } else {
                    selection.credentials.insert(key.to_string(), value.to_string());
                }
            }
        });
    }

    /// Saves enabled selections only, then returns to the dashboard
    pub fn save_merchant(&self) {
        let (merchant_id, configs) = match self.state.with(|s| {
            s.merchant
                .as_ref()
                .map(|m| (m.merchant_id.clone(), configs_to_save(&s.selections)))
        }) {
            Some(pair) => pair,
            None => return,
        };
        self.state.update(|s| {
            s.busy = true;
            s.error = None;
        });

        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.merchants.save_services(&merchant_id, &configs).await {
                Ok(message) => {
                    vm.state.update(|s| {
                        s.busy = false;
                        s.notice = Some(if message.is_empty() {
                            "Changes saved.".to_string()
                        } else {
                            message
                        });
                    });
                    vm.navigator.navigate(Route::AdminDashboard);
                }
                Err(e) => vm.fail("Could not save the merchant services", e),
            }
        }));
    }

    // ------------------------------------------------------------------
    // Payment methods
    // ------------------------------------------------------------------

    pub fn load_methods(&self) {
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.methods.list().await {
                Ok(methods) => vm.state.update(|s| s.methods = methods),
                Err(e) => vm.fail("Could not load payment methods", e),
            }
        }));
    }

    pub fn add_method(&self, name: &str, service_url: &str) {
        if let Err(e) = validation::required("Name", name)
            .and_then(|_| validation::required("Service URL", service_url))
        {
            self.state.update(|s| s.error = Some(e.to_string()));
            return;
        }
        let method = NewPaymentMethod {
            name: name.trim().to_string(),
            service_url: service_url.trim().to_string(),
        };
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.methods.create(&method).await {
                Ok(created) => vm.state.update(|s| {
                    s.methods.push(created);
                    s.error = None;
                }),
                Err(e) => vm.fail("Method already exists or the URL is invalid", e),
            }
        }));
    }

    pub fn delete_method(&self, id: i64) {
        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.methods.delete(id).await {
                Ok(()) => vm.state.update(|s| s.methods.retain(|m| m.id != Some(id))),
                Err(e) => vm.fail("Could not delete the payment method", e),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ApiClient;
    use crate::testing::{FakeScheduler, RecordingNavigator, ScriptedTransport};

    fn fixture() -> (AdminViewModel, Rc<ScriptedTransport>, Rc<RecordingNavigator>, Rc<FakeScheduler>) {
        let transport = Rc::new(ScriptedTransport::new());
        let navigator = Rc::new(RecordingNavigator::new());
        let scheduler = Rc::new(FakeScheduler::new());
        let client = ApiClient::new("http://psp", transport.clone());
        let vm = AdminViewModel::new(
            Rc::new(MerchantService::new(client.clone())),
            Rc::new(PaymentMethodService::new(client)),
            navigator.clone(),
            scheduler.clone(),
        );
        (vm, transport, navigator, scheduler)
    }

    #[test]
    fn created_merchant_is_listed_with_credentials() {
        let (vm, transport, _, scheduler) = fixture();
        transport.reply(200, r#"[]"#);
        vm.load_merchants();
        scheduler.run_until_stalled();

        transport.reply(200, r#"{"merchantId":"m-9","merchantPassword":"pw"}"#);
        vm.create_merchant("Rent a car", "https://shop");
        scheduler.run_until_stalled();

        let state = vm.state().get();
        assert_eq!(state.merchants.len(), 1);
        assert_eq!(state.merchants[0].merchant_id, "m-9");
        assert_eq!(state.created_credentials.unwrap().merchant_password, "pw");

        vm.dismiss_credentials();
        assert!(vm.state().get().created_credentials.is_none());
    }

    #[test]
    fn merchant_details_save_only_enabled_methods() {
        let (vm, transport, navigator, scheduler) = fixture();
        transport.reply_for(
            "/api/payment-methods",
            200,
            r#"[{"id":1,"name":"CARD","serviceUrl":"http://card"},{"id":2,"name":"QR","serviceUrl":"http://qr"}]"#,
        );
        transport.reply_for("/subscriptions", 200, r#"[{"id":5,"paymentMethod":{"id":1,"name":"CARD"},"credentialsJson":"{\"apiKey\":\"k\"}"}]"#);
        transport.reply_for("/api/admin/merchants/m-1", 200, r#"{"merchantId":"m-1","name":"Shop"}"#);

        vm.open_merchant("m-1");
        scheduler.run_until_stalled();
        let selections = vm.state().get().selections;
        assert_eq!(selections.len(), 2);
        assert!(selections[0].enabled);
        assert!(!selections[1].enabled);

        vm.toggle_method("CARD", false);
        vm.toggle_method("QR", true);
        vm.set_credential("QR", "bankAccount", "RS35");
        transport.reply(200, "Services updated.");
        vm.save_merchant();
        scheduler.run_until_stalled();

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://psp/api/admin/merchants/m-1/services");
        assert_eq!(
            request.body.as_deref(),
            Some(r#"[{"methodName":"QR","credentials":{"bankAccount":"RS35"}}]"#)
        );
        assert_eq!(navigator.routes(), vec![Route::AdminDashboard]);
    }

    #[test]
    fn deleting_a_method_removes_it_locally() {
        let (vm, transport, _, scheduler) = fixture();
        transport.reply(200, r#"[{"id":1,"name":"CARD"},{"id":2,"name":"QR"}]"#);
        vm.load_methods();
        scheduler.run_until_stalled();

        transport.reply(204, "");
        vm.delete_method(1);
        scheduler.run_until_stalled();
        let names: Vec<String> = vm.state().get().methods.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["QR"]);
    }

    #[test]
    fn empty_method_name_is_rejected_locally() {
        let (vm, transport, _, _) = fixture();
        vm.add_method("", "http://x");
        assert_eq!(transport.request_count(), 0);
        assert!(vm.state().get().error.is_some());
    }
}
