// ============================================================================
// AUTH VIEWMODEL - login, MFA, registration, password change
// ============================================================================
// Every form is validated locally first; a validation error never produces a
// request.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::models::{ChangePasswordForm, LoginOutcome, RegisterRequest};
use crate::routing::{AppKind, Navigator};
use crate::services::{AuthService, IdleMonitor, Scheduler, TimerHandle};
use crate::state::ReactiveState;
use crate::utils::validation::{self, PasswordPolicy};

const LOGIN_FAILED: &str = "Login failed. Please try again later.";
const MFA_FAILED: &str = "The code is invalid or has expired.";
const REGISTER_DONE: &str = "Registration successful. Redirecting to login...";
const PASSWORD_CHANGED: &str = "Password changed. Redirecting to login...";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub busy: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Registration form as typed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest> {
        validation::required("Name", &self.name)?;
        validation::required("Surname", &self.surname)?;
        validation::email(&self.email)?;
        PasswordPolicy::STRONG.check(&self.password)?;
        validation::passwords_match(&self.password, &self.confirm_password)?;
        Ok(RegisterRequest {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

impl ChangePasswordForm {
    pub fn validate(&self, policy: PasswordPolicy) -> Result<()> {
        validation::required("Account", &self.account)?;
        if !self.first_time {
            validation::required(
                "Current password",
                self.old_password.as_deref().unwrap_or_default(),
            )?;
        }
        policy.check(&self.new_password)?;
        validation::passwords_match(&self.new_password, &self.confirm_password)
    }
}

fn password_change_policy(kind: AppKind) -> PasswordPolicy {
    match kind {
        AppKind::PspFront => PasswordPolicy::STRONG,
        AppKind::WebShop => PasswordPolicy::BASIC,
    }
}

fn message_for(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Validation(message) => message.clone(),
        ApiError::Unauthorized { .. }
        | ApiError::Forbidden { .. }
        | ApiError::Http { .. }
        | ApiError::NotFound { .. } => error
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
        _ => fallback.to_string(),
    }
}

#[derive(Clone)]
pub struct AuthViewModel {
    kind: AppKind,
    auth: Rc<AuthService>,
    idle: IdleMonitor,
    navigator: Rc<dyn Navigator>,
    scheduler: Rc<dyn Scheduler>,
    redirect_delay: Duration,
    state: ReactiveState<AuthState>,
    pending_redirect: Rc<RefCell<Option<TimerHandle>>>,
}

impl AuthViewModel {
    pub fn new(
        kind: AppKind,
        auth: Rc<AuthService>,
        idle: IdleMonitor,
        navigator: Rc<dyn Navigator>,
        scheduler: Rc<dyn Scheduler>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            kind,
            auth,
            idle,
            navigator,
            scheduler,
            redirect_delay,
            state: ReactiveState::default(),
            pending_redirect: Rc::new(RefCell::new(None)),
        }
    }

    pub fn state(&self) -> ReactiveState<AuthState> {
        self.state.clone()
    }

    fn begin(&self) -> bool {
        if self.state.with(|s| s.busy) {
            return false;
        }
        self.state.set(AuthState {
            busy: true,
            ..AuthState::default()
        });
        true
    }

    fn fail(&self, message: String) {
        self.state.set(AuthState {
            busy: false,
            error: Some(message),
            success: None,
        });
    }

    fn validate_identifier(&self, identifier: &str) -> Result<()> {
        match self.kind {
            AppKind::WebShop => validation::email(identifier),
            AppKind::PspFront => validation::required("Username", identifier),
        }
    }

    pub fn login(&self, identifier: &str, password: &str) {
        let identifier = identifier.trim().to_string();
        if let Err(e) = self
            .validate_identifier(&identifier)
            .and_then(|_| validation::required("Password", password))
        {
            self.fail(message_for(&e, LOGIN_FAILED));
            return;
        }
        if !self.begin() {
            return;
        }

        let vm = self.clone();
        let password = password.to_string();
        self.scheduler.spawn(Box::pin(async move {
            match vm.auth.login(&identifier, &password).await {
                Ok(LoginOutcome::Authenticated { .. }) => vm.signed_in(),
                Ok(LoginOutcome::MfaRequired { account }) => {
                    vm.state.set(AuthState::default());
                    vm.navigator.navigate(vm.kind.mfa_route(&account));
                }
                Ok(LoginOutcome::PasswordChangeRequired { account }) => {
                    vm.state.set(AuthState::default());
                    vm.navigator
                        .navigate(vm.kind.change_password_route(&account, true));
                }
                Ok(LoginOutcome::Rejected { message }) => vm.fail(message),
                Err(e) => {
                    log::error!("❌ Login failed: {}", e);
                    vm.fail(message_for(&e, LOGIN_FAILED));
                }
            }
        }));
    }

    pub fn verify_mfa(&self, account: &str, code: &str) {
        let code = match validation::required("Account", account)
            .and_then(|_| validation::mfa_code(code))
        {
            Ok(code) => code,
            Err(e) => {
                self.fail(message_for(&e, MFA_FAILED));
                return;
            }
        };
        if !self.begin() {
            return;
        }

        let vm = self.clone();
        let account = account.to_string();
        self.scheduler.spawn(Box::pin(async move {
            match vm.auth.verify_mfa(&account, &code).await {
                Ok(()) => vm.signed_in(),
                Err(e) => {
                    log::error!("❌ MFA verification failed: {}", e);
                    vm.fail(message_for(&e, MFA_FAILED));
                }
            }
        }));
    }

    fn signed_in(&self) {
        self.state.set(AuthState::default());
        self.idle.start_watching();
        self.navigator.navigate(self.kind.home_route());
    }

    pub fn register(&self, form: &RegisterForm) {
        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.fail(message_for(&e, "Registration failed."));
                return;
            }
        };
        if !self.begin() {
            return;
        }

        let vm = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match vm.auth.register(&request).await {
                Ok(_) => vm.succeed_then_login(REGISTER_DONE),
                Err(e) => {
                    log::error!("❌ Registration failed: {}", e);
                    vm.fail(message_for(&e, "Registration failed."));
                }
            }
        }));
    }

    pub fn change_password(&self, form: &ChangePasswordForm) {
        if let Err(e) = form.validate(password_change_policy(self.kind)) {
            self.fail(message_for(&e, "Password change failed."));
            return;
        }
        if !self.begin() {
            return;
        }

        let vm = self.clone();
        let form = form.clone();
        self.scheduler.spawn(Box::pin(async move {
            let old = if form.first_time {
                None
            } else {
                form.old_password.as_deref()
            };
            match vm
                .auth
                .change_password(&form.account, old, &form.new_password)
                .await
            {
                Ok(_) => {
                    vm.auth.logout();
                    vm.succeed_then_login(PASSWORD_CHANGED);
                }
                Err(e) => {
                    log::error!("❌ Password change failed: {}", e);
                    vm.fail(message_for(&e, "Password change failed."));
                }
            }
        }));
    }

    fn succeed_then_login(&self, message: &str) {
        self.state.set(AuthState {
            busy: false,
            error: None,
            success: Some(message.to_string()),
        });
        let navigator = self.navigator.clone();
        let login = self.kind.login_route(false, false);
        let handle = self
            .scheduler
            .schedule(self.redirect_delay, Box::new(move || navigator.navigate(login)));
        *self.pending_redirect.borrow_mut() = Some(handle);
    }

    pub fn logout(&self) {
        self.idle.stop_watching();
        self.auth.logout();
        self.navigator.navigate(self.kind.login_route(false, false));
    }

    /// Drops a pending post-success redirect
    pub fn leave(&self) {
        self.pending_redirect.borrow_mut().take();
    }
}
