// ============================================================================
// CHECKOUT VIEWMODEL - payment method selection state machine
// ============================================================================
// Loading -> Ready -> Pending -> { Redirecting | AwaitingConfirmation | Failed }
//
// Only the latest initiation is authoritative: starting a new one aborts the
// previous future and bumps the generation, so a late completion is ignored.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{CheckoutTransaction, InitiationResult};
use crate::routing::{Navigator, Route};
use crate::services::{with_timeout, PaymentService, Scheduler};
use crate::state::ReactiveState;
use crate::utils::constants::CRYPTO_METHOD;

pub const NOT_FOUND_MESSAGE: &str = "This payment link is invalid or has expired.";
pub const TIMEOUT_MESSAGE: &str =
    "The payment service did not answer in time. You can try again.";
pub const RETRY_GUIDANCE: &str = "Please select the same or a different payment method to try again.";
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the payment service. Please check your connection and try again.";
const UNAVAILABLE_FALLBACK: &str = "The payment provider is temporarily unavailable.";
const NO_COMPLETION_URL: &str = "The payment was confirmed without a return address.";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CheckoutPhase {
    Loading,
    Ready,
    Pending {
        method: String,
    },
    AwaitingConfirmation {
        method: String,
        qr_data: String,
        mismatch: bool,
        verifying: bool,
    },
    Redirecting {
        url: String,
    },
    Failed {
        message: String,
        retryable: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutState {
    pub transaction_id: String,
    pub transaction: Option<CheckoutTransaction>,
    pub phase: CheckoutPhase,
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self {
            transaction_id: String::new(),
            transaction: None,
            phase: CheckoutPhase::Loading,
        }
    }
}

/// Message shown for a failed initiation or verification
pub fn failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Timeout => TIMEOUT_MESSAGE.to_string(),
        ApiError::ServiceUnavailable {
            message,
            retryable: true,
        } => {
            let reason = if message.is_empty() {
                UNAVAILABLE_FALLBACK
            } else {
                message.as_str()
            };
            format!("{} {}", reason, RETRY_GUIDANCE)
        }
        _ => CONNECTIVITY_MESSAGE.to_string(),
    }
}

#[derive(Clone)]
pub struct CheckoutViewModel {
    payments: Rc<PaymentService>,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    timeout: Duration,
    state: ReactiveState<CheckoutState>,
    in_flight: Rc<RefCell<Option<AbortHandle>>>,
    generation: Rc<Cell<u64>>,
}

impl CheckoutViewModel {
    pub fn new(
        payments: Rc<PaymentService>,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        timeout: Duration,
    ) -> Self {
        Self {
            payments,
            navigator,
            scheduler,
            timeout,
            state: ReactiveState::default(),
            in_flight: Rc::new(RefCell::new(None)),
            generation: Rc::new(Cell::new(0)),
        }
    }

    pub fn state(&self) -> ReactiveState<CheckoutState> {
        self.state.clone()
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.state.with(|s| s.phase.clone())
    }

    /// Aborts whatever is outstanding and returns the new generation
    fn begin(&self) -> u64 {
        if let Some(handle) = self.in_flight.borrow_mut().take() {
            log::info!("🛑 Cancelling outstanding payment request");
            handle.abort();
        }
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    fn set_phase(&self, phase: CheckoutPhase) {
        self.state.update(|s| s.phase = phase);
    }

    fn spawn_tracked<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + 'static,
    {
        let (task, handle) = abortable(future);
        *self.in_flight.borrow_mut() = Some(handle);
        self.scheduler.spawn(Box::pin(async move {
            let _ = task.await;
        }));
    }

    /// Loads the transaction for a checkout page
    pub fn open(&self, transaction_id: &str) {
        let generation = self.begin();
        self.state.set(CheckoutState {
            transaction_id: transaction_id.to_string(),
            transaction: None,
            phase: CheckoutPhase::Loading,
        });

        let vm = self.clone();
        let id = transaction_id.to_string();
        self.spawn_tracked(async move {
            let result = vm.payments.get_checkout(&id).await;
            if !vm.is_current(generation) {
                return;
            }
            vm.in_flight.borrow_mut().take();
            match result {
                Ok(transaction) => vm.state.update(|s| {
                    s.transaction = Some(transaction);
                    s.phase = CheckoutPhase::Ready;
                }),
                Err(e) => {
                    log::error!("❌ Checkout {} could not be loaded: {}", id, e);
                    // Any load failure reads as a dead link; only a 404 is final
                    let retryable = !matches!(e, ApiError::NotFound { .. });
                    vm.set_phase(CheckoutPhase::Failed {
                        message: NOT_FOUND_MESSAGE.to_string(),
                        retryable,
                    });
                }
            }
        });
    }

    pub fn select_method(&self, method: &str) {
        let (transaction_id, ready) = self.state.with(|s| {
            (
                s.transaction_id.clone(),
                s.transaction.is_some()
                    && !matches!(s.phase, CheckoutPhase::Loading | CheckoutPhase::Redirecting { .. }),
            )
        });
        if !ready {
            log::warn!("⚠️ Method {} selected before the checkout is ready", method);
            return;
        }

        let generation = self.begin();
        if method == CRYPTO_METHOD {
            self.set_phase(CheckoutPhase::Ready);
            self.navigator.navigate(Route::CryptoCheckout { id: transaction_id });
            return;
        }

        self.set_phase(CheckoutPhase::Pending {
            method: method.to_string(),
        });

        let vm = self.clone();
        let method = method.to_string();
        self.spawn_tracked(async move {
            let result = with_timeout(
                vm.scheduler.as_ref(),
                vm.timeout,
                vm.payments.initiate(&transaction_id, &method),
            )
            .await;
            if !vm.is_current(generation) {
                log::debug!("Ignoring stale {} initiation", method);
                return;
            }
            vm.in_flight.borrow_mut().take();
            vm.apply_initiation(method, result);
        });
    }

    fn apply_initiation(&self, method: String, result: crate::error::Result<InitiationResult>) {
        match result {
            Ok(InitiationResult::Redirect { payment_url }) => {
                self.set_phase(CheckoutPhase::Redirecting {
                    url: payment_url.clone(),
                });
                self.navigator.redirect_external(&payment_url);
            }
            Ok(InitiationResult::DisplayCode { qr_data }) => {
                log::info!("📱 Waiting for {} confirmation", method);
                self.set_phase(CheckoutPhase::AwaitingConfirmation {
                    method,
                    qr_data,
                    mismatch: false,
                    verifying: false,
                });
            }
            Ok(InitiationResult::Failed { error }) => {
                log::warn!("⚠️ {} initiation refused: {}", method, error);
                self.set_phase(CheckoutPhase::Failed {
                    message: error,
                    retryable: true,
                });
            }
            Err(e) => {
                log::error!("❌ {} initiation failed: {}", method, e);
                self.set_phase(CheckoutPhase::Failed {
                    message: failure_message(&e),
                    retryable: true,
                });
            }
        }
    }

    /// Submits the scanned counter-code. A mismatch never reaches the network.
    pub fn confirm_scan(&self, scanned: &str) {
        let (transaction_id, expected) = match self.state.with(|s| {
            let expected = match &s.phase {
                CheckoutPhase::AwaitingConfirmation {
                    qr_data,
                    verifying: false,
                    ..
                } => Some(qr_data.clone()),
                _ => None,
            };
            (s.transaction_id.clone(), expected)
        }) {
            (id, Some(expected)) => (id, expected),
            _ => return,
        };

        let scanned = scanned.trim().to_string();
        let mismatch = scanned != expected;
        self.state.update(|s| {
            if let CheckoutPhase::AwaitingConfirmation {
                mismatch: m,
                verifying,
                ..
            } = &mut s.phase
            {
                *m = mismatch;
                *verifying = !mismatch;
            }
        });
        if mismatch {
            log::warn!("⚠️ Scanned code does not match the displayed one");
            return;
        }

        let generation = self.begin();
        let vm = self.clone();
        self.spawn_tracked(async move {
            let result = vm.payments.verify_qr(&transaction_id, &scanned).await;
            if !vm.is_current(generation) {
                return;
            }
            vm.in_flight.borrow_mut().take();
            match result {
                Ok(response) => {
                    let completion = response.completion_url().map(str::to_string);
                    match completion {
                        Some(url) => {
                            vm.set_phase(CheckoutPhase::Redirecting { url: url.clone() });
                            vm.navigator.redirect_external(&url);
                        }
                        None => vm.set_phase(CheckoutPhase::Failed {
                            message: response
                                .message
                                .unwrap_or_else(|| NO_COMPLETION_URL.to_string()),
                            retryable: true,
                        }),
                    }
                }
                Err(e) => {
                    log::error!("❌ QR verification failed: {}", e);
                    vm.set_phase(CheckoutPhase::Failed {
                        message: failure_message(&e),
                        retryable: true,
                    });
                }
            }
        });
    }

    /// Drops a pending initiation (or a displayed code) and returns to `Ready`
    pub fn cancel(&self) {
        let cancellable = self.state.with(|s| {
            matches!(
                s.phase,
                CheckoutPhase::Pending { .. } | CheckoutPhase::AwaitingConfirmation { .. }
            )
        });
        if cancellable {
            self.begin();
            self.set_phase(CheckoutPhase::Ready);
        }
    }

    /// Back to `Ready` without reloading; reloads only when nothing was loaded
    pub fn retry(&self) {
        let (failed, loaded, id) = self.state.with(|s| {
            (
                matches!(s.phase, CheckoutPhase::Failed { .. }),
                s.transaction.is_some(),
                s.transaction_id.clone(),
            )
        });
        if !failed {
            return;
        }
        if loaded {
            self.set_phase(CheckoutPhase::Ready);
        } else {
            self.open(&id);
        }
    }

    pub fn snapshot_json(&self) -> String {
        self.state
            .with(|s| serde_json::to_string(s))
            .unwrap_or_else(|_| "{}".to_string())
    }
}
