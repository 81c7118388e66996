use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};
use serde::Serialize;

use crate::models::CryptoDetails;
use crate::routing::{Navigator, Route};
use crate::services::{PaymentService, Scheduler};
use crate::state::ReactiveState;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoState {
    pub transaction_id: String,
    pub btc_amount: String,
    pub wallet_address: String,
    pub qr_code_url: String,
    pub loading: bool,
    pub polling: bool,
    pub redirect_url: Option<String>,
    pub error: Option<String>,
}

impl CryptoState {
    fn apply(&mut self, details: CryptoDetails) {
        self.btc_amount = details.btc_amount;
        self.wallet_address = details.wallet_address;
        self.qr_code_url = details.qr_code_url;
    }
}

/// Crypto payment page: show the wallet details, then wait for the chain
#[derive(Clone)]
pub struct CryptoCheckoutViewModel {
    payments: Rc<PaymentService>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    poll_interval: Duration,
    state: ReactiveState<CryptoState>,
    poller: Rc<RefCell<Option<AbortHandle>>>,
}

impl CryptoCheckoutViewModel {
    pub fn new(
        payments: Rc<PaymentService>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            payments,
            navigator,
            scheduler,
            poll_interval,
            state: ReactiveState::default(),
            poller: Rc::new(RefCell::new(None)),
        }
    }

    pub fn state(&self) -> ReactiveState<CryptoState> {
        self.state.clone()
    }

    pub fn open(&self, transaction_id: &str) {
        self.stop();
        self.state.set(CryptoState {
            transaction_id: transaction_id.to_string(),
            loading: true,
            polling: true,
            ..CryptoState::default()
        });

        let vm = self.clone();
        let id = transaction_id.to_string();
        let (task, handle) = abortable(async move {
            match vm.payments.crypto_details(&id).await {
                Ok(details) => vm.state.update(|s| {
                    s.apply(details);
                    s.loading = false;
                }),
                Err(e) => {
                    log::error!("❌ Crypto details for {} unavailable: {}", id, e);
                    vm.state.update(|s| {
                        s.loading = false;
                        s.error = Some("Could not load the crypto payment details.".to_string());
                    });
                }
            }
            vm.poll(&id).await;
        });
        *self.poller.borrow_mut() = Some(handle);
        self.scheduler.spawn(Box::pin(async move {
            let _ = task.await;
        }));
    }

    async fn poll(&self, id: &str) {
        loop {
            self.scheduler.sleep(self.poll_interval).await;
            match self.payments.crypto_status(id).await {
                Ok(status) => {
                    if let Some(url) = status.redirect_url.filter(|u| !u.is_empty()) {
                        log::info!("₿ Crypto payment {} settled", id);
                        self.poller.borrow_mut().take();
                        self.state.update(|s| {
                            s.polling = false;
                            s.redirect_url = Some(url.clone());
                        });
                        self.navigator.redirect_external(&url);
                        return;
                    }
                }
                // Transient; the next tick asks again
                Err(e) => log::warn!("⚠️ Crypto status check failed: {}", e),
            }
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.borrow().is_some()
    }

    pub fn stop(&self) {
        if let Some(handle) = self.poller.borrow_mut().take() {
            log::debug!("Crypto status polling stopped");
            handle.abort();
        }
        self.state.update(|s| s.polling = false);
    }

    /// Back to method selection for the same transaction
    pub fn back(&self) {
        self.stop();
        let id = self.state.with(|s| s.transaction_id.clone());
        self.navigator.navigate(Route::Checkout { id });
    }
}
