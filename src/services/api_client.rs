// ============================================================================
// API CLIENT - HTTP only (stateless)
// ============================================================================
// No business logic: builds URLs, sends through the injected transport and
// turns non-2xx responses into ApiError.
// ============================================================================

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::services::http::{HttpRequest, HttpResponse, HttpTransport};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Rc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.as_str();
        let url = request.url.clone();
        log::debug!("📡 {} {}", method, url);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("❌ {} {} failed: {}", method, url, e);
                return Err(e);
            }
        };

        if !response.ok() {
            log::warn!("⚠️ {} {} -> HTTP {}", method, url, response.status);
        }
        response.error_for_status()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(HttpRequest::get(self.url(path)))
            .await?
            .json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = HttpRequest::post(self.url(path)).json(body)?;
        self.execute(request).await?.json()
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = HttpRequest::put(self.url(path)).json(body)?;
        self.execute(request).await?.json()
    }

    /// POST whose success body is plain text (or ignored)
    pub async fn post_text<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        let request = HttpRequest::post(self.url(path)).json(body)?;
        Ok(self.execute(request).await?.body)
    }

    /// POST without a body, returning the raw response for shape validation
    pub async fn post_empty(&self, path: &str) -> Result<HttpResponse> {
        self.execute(HttpRequest::post(self.url(path))).await
    }

    pub async fn delete(&self, path: &str) -> Result<String> {
        Ok(self
            .execute(HttpRequest::delete(self.url(path)))
            .await?
            .body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::http::HttpMethod;
    use crate::testing::ScriptedTransport;
    use futures::executor::block_on;

    #[test]
    fn joins_base_url_and_decodes_json() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.reply(200, r#"{"value":3}"#);
        let client = ApiClient::new("https://gateway:8443/", transport.clone());

        let body: serde_json::Value = block_on(client.get_json("/orders/7")).unwrap();
        assert_eq!(body["value"], 3);

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://gateway:8443/orders/7");
        assert_eq!(sent.method, HttpMethod::Get);
    }

    #[test]
    fn non_success_status_is_an_error() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.reply(403, r#"{"message":"Admins only"}"#);
        let client = ApiClient::new("http://api", transport);
        let result: Result<serde_json::Value> = block_on(client.get_json("/vehicles"));
        assert_eq!(result, Err(ApiError::Forbidden { message: "Admins only".to_string() }));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.reply(200, "not json");
        let client = ApiClient::new("http://api", transport);
        let result: Result<Vec<i32>> = block_on(client.get_json("/x"));
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }
}
