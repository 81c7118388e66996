use crate::error::Result;
use crate::models::{
    Merchant, MerchantCreateRequest, MerchantCredentials, MerchantServiceConfig, NewPaymentMethod,
    PaymentMethodRecord, Subscription,
};
use crate::services::api_client::ApiClient;

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Merchant administration (PSP dashboard)
#[derive(Clone)]
pub struct MerchantService {
    client: ApiClient,
}

impl MerchantService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Merchant>> {
        self.client.get_json("/api/merchants").await
    }

    pub async fn create(&self, request: &MerchantCreateRequest) -> Result<MerchantCredentials> {
        log::info!("🏪 Creating merchant {}", request.name);
        self.client.post_json("/api/merchants/create", request).await
    }

    pub async fn get(&self, merchant_id: &str) -> Result<Merchant> {
        self.client
            .get_json(&format!("/api/admin/merchants/{}", segment(merchant_id)))
            .await
    }

    pub async fn subscriptions(&self, merchant_id: &str) -> Result<Vec<Subscription>> {
        self.client
            .get_json(&format!("/api/merchants/{}/subscriptions", segment(merchant_id)))
            .await
    }

    pub async fn save_services(
        &self,
        merchant_id: &str,
        configs: &[MerchantServiceConfig],
    ) -> Result<String> {
        log::info!("💾 Saving {} services for {}", configs.len(), merchant_id);
        self.client
            .post_text(
                &format!("/api/admin/merchants/{}/services", segment(merchant_id)),
                configs,
            )
            .await
    }
}

/// Global payment method registry (PSP dashboard)
#[derive(Clone)]
pub struct PaymentMethodService {
    client: ApiClient,
}

impl PaymentMethodService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<PaymentMethodRecord>> {
        self.client.get_json("/api/payment-methods").await
    }

    pub async fn create(&self, method: &NewPaymentMethod) -> Result<PaymentMethodRecord> {
        log::info!("➕ Registering payment method {}", method.name);
        self.client.post_json("/api/payment-methods", method).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        log::info!("🗑️ Deleting payment method {}", id);
        self.client
            .delete(&format!("/api/payment-methods/{}", id))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::http::HttpMethod;
    use crate::testing::ScriptedTransport;
    use futures::executor::block_on;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[test]
    fn create_merchant_returns_credentials_once() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.reply(200, r#"{"merchantId":"rent-a-car","merchantPassword":"s3cret"}"#);
        let merchants = MerchantService::new(ApiClient::new("http://psp", transport.clone()));

        let credentials = block_on(merchants.create(&MerchantCreateRequest {
            name: "Rent a car".to_string(),
            web_shop_url: "https://shop".to_string(),
        }))
        .unwrap();
        assert_eq!(credentials.merchant_password, "s3cret");
        assert_eq!(transport.last_request().unwrap().url, "http://psp/api/merchants/create");
    }

    #[test]
    fn save_services_posts_array() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.reply(200, "Services updated.");
        let merchants = MerchantService::new(ApiClient::new("http://psp", transport.clone()));
        let mut credentials = BTreeMap::new();
        credentials.insert("apiKey".to_string(), "k".to_string());
        let configs = vec![MerchantServiceConfig { method_name: "CARD".to_string(), credentials }];

        block_on(merchants.save_services("m-1", &configs)).unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://psp/api/admin/merchants/m-1/services");
        assert_eq!(
            request.body.as_deref(),
            Some(r#"[{"methodName":"CARD","credentials":{"apiKey":"k"}}]"#)
        );
    }

    #[test]
    fn delete_payment_method() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.reply(204, "");
        let methods = PaymentMethodService::new(ApiClient::new("http://psp", transport.clone()));
        block_on(methods.delete(4)).unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.url, "http://psp/api/payment-methods/4");
    }
}
