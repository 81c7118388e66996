use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{extract_message, ApiError, Result};
use crate::models::{LoginOutcome, LoginResponse, RegisterRequest};
use crate::routing::AppKind;
use crate::services::api_client::ApiClient;
use crate::services::http::HttpRequest;
use crate::state::SessionStore;

/// Login, MFA, registration and password change for one front-end.
///
/// Only a token-bearing login or a successful MFA verification writes to the
/// session store.
pub struct AuthService {
    client: ApiClient,
    session: Rc<SessionStore>,
    kind: AppKind,
}

impl AuthService {
    pub fn new(kind: AppKind, client: ApiClient, session: Rc<SessionStore>) -> Self {
        Self {
            client,
            session,
            kind,
        }
    }

    fn prefix(&self) -> &'static str {
        match self.kind {
            AppKind::PspFront => "/api/admin",
            AppKind::WebShop => "/auth",
        }
    }

    /// `username` for PSP admins, `email` for web-shop accounts
    pub fn identifier_field(&self) -> &'static str {
        match self.kind {
            AppKind::PspFront => "username",
            AppKind::WebShop => "email",
        }
    }

    fn credentials_body(&self, identifier: &str, extra: &[(&str, &str)]) -> Value {
        let mut body = Map::new();
        body.insert(
            self.identifier_field().to_string(),
            Value::String(identifier.to_string()),
        );
        for (key, value) in extra {
            body.insert(key.to_string(), Value::String(value.to_string()));
        }
        Value::Object(body)
    }

    /// Some backends answer with plain text; that is read as a message
    async fn post_for_login_response(&self, path: &str, body: &Value) -> Result<LoginResponse> {
        let request = HttpRequest::post(self.client.url(path)).json(body)?;
        let response = self.client.execute(request).await?;
        Ok(serde_json::from_str::<LoginResponse>(&response.body).unwrap_or_else(|_| {
            LoginResponse {
                message: Some(extract_message(&response.body)),
                ..LoginResponse::default()
            }
        }))
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome> {
        log::info!("🔐 Login attempt for {}", identifier);
        let path = format!("{}/login", self.prefix());
        let body = self.credentials_body(identifier, &[("password", password)]);

        let outcome = self
            .post_for_login_response(&path, &body)
            .await?
            .classify(identifier);

        match &outcome {
            LoginOutcome::Authenticated { token } => {
                self.session.set_token(token)?;
                log::info!("✅ Logged in as {}", identifier);
            }
            LoginOutcome::MfaRequired { account } => {
                log::info!("📧 MFA code required for {}", account);
            }
            LoginOutcome::PasswordChangeRequired { account } => {
                log::info!("🔑 Password change required for {}", account);
            }
            LoginOutcome::Rejected { message } => {
                log::warn!("⚠️ Login rejected: {}", message);
            }
        }
        Ok(outcome)
    }

    pub async fn verify_mfa(&self, account: &str, code: &str) -> Result<()> {
        let path = format!("{}/verify-mfa", self.prefix());
        let body = self.credentials_body(account, &[("code", code)]);

        let response = self.post_for_login_response(&path, &body).await?;
        match response.token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.session.set_token(&token)?;
                log::info!("✅ MFA verified for {}", account);
                Ok(())
            }
            None => Err(ApiError::UnexpectedShape(
                response
                    .message
                    .unwrap_or_else(|| "MFA verification returned no token".to_string()),
            )),
        }
    }

    /// Web-shop registration; returns the backend's confirmation text
    pub async fn register(&self, request: &RegisterRequest) -> Result<String> {
        let path = format!("{}/register", self.prefix());
        log::info!("📝 Registering {}", request.email);
        let body = self.client.post_text(&path, request).await?;
        Ok(extract_message(&body))
    }

    /// `old_password` is omitted for first-time admins
    pub async fn change_password(
        &self,
        account: &str,
        old_password: Option<&str>,
        new_password: &str,
    ) -> Result<String> {
        let path = format!("{}/change-password", self.prefix());
        let mut extra = vec![("newPassword", new_password)];
        if let Some(old) = old_password.filter(|o| !o.is_empty()) {
            extra.push(("oldPassword", old));
        }
        let body = self.credentials_body(account, &extra);
        let text = self.client.post_text(&path, &body).await?;
        log::info!("🔑 Password changed for {}", account);
        Ok(extract_message(&text))
    }

    pub fn logout(&self) {
        self.session.clear();
        log::info!("👋 Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::utils::MemoryStorage;
    use futures::executor::block_on;
    use std::time::Duration;

    fn service(kind: AppKind) -> (AuthService, Rc<ScriptedTransport>, Rc<SessionStore>) {
        let transport = Rc::new(ScriptedTransport::new());
        let session = Rc::new(SessionStore::new(
            Rc::new(MemoryStorage::new()),
            "token",
            Duration::from_secs(30),
        ));
        let client = ApiClient::new("http://api", transport.clone());
        (AuthService::new(kind, client, session.clone()), transport, session)
    }

    fn sent_body(transport: &ScriptedTransport) -> Value {
        serde_json::from_str(transport.last_request().unwrap().body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn web_shop_login_stores_token() {
        let (auth, transport, session) = service(AppKind::WebShop);
        transport.reply(200, r#"{"message":"ok","token":"h.p.s","mustChangePassword":false}"#);

        let outcome = block_on(auth.login("ana@example.com", "secret")).unwrap();
        assert_eq!(outcome, LoginOutcome::Authenticated { token: "h.p.s".to_string() });
        assert_eq!(session.get_token().as_deref(), Some("h.p.s"));

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://api/auth/login");
        assert_eq!(sent_body(&transport)["email"], "ana@example.com");
    }

    #[test]
    fn mfa_login_does_not_store_a_token() {
        let (auth, transport, session) = service(AppKind::PspFront);
        transport.reply(200, r#"{"status":"MFA_REQUIRED","username":"root"}"#);

        let outcome = block_on(auth.login("root", "pw")).unwrap();
        assert_eq!(outcome, LoginOutcome::MfaRequired { account: "root".to_string() });
        assert!(!session.has_token());
        assert_eq!(transport.last_request().unwrap().url, "http://api/api/admin/login");
        assert_eq!(sent_body(&transport)["username"], "root");
    }

    #[test]
    fn wrong_credentials_surface_as_unauthorized() {
        let (auth, transport, _) = service(AppKind::PspFront);
        transport.reply(401, "Wrong password.");
        assert_eq!(
            block_on(auth.login("root", "bad")),
            Err(ApiError::Unauthorized { message: "Wrong password.".to_string() })
        );
    }

    #[test]
    fn verify_mfa_stores_returned_token() {
        let (auth, transport, session) = service(AppKind::WebShop);
        transport.reply(200, r#"{"message":"Login successful","token":"m.f.a"}"#);
        block_on(auth.verify_mfa("ana@example.com", "123456")).unwrap();
        assert_eq!(session.get_token().as_deref(), Some("m.f.a"));
        assert_eq!(sent_body(&transport)["code"], "123456");
    }

    #[test]
    fn first_time_password_change_omits_old_password() {
        let (auth, transport, _) = service(AppKind::PspFront);
        transport.reply(200, r#"{"message":"Password changed"}"#);
        let message = block_on(auth.change_password("root", None, "newpassword123")).unwrap();
        assert_eq!(message, "Password changed");
        let body = sent_body(&transport);
        assert!(body.get("oldPassword").is_none());
        assert_eq!(body["newPassword"], "newpassword123");
    }
}
