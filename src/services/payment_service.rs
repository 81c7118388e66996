use crate::error::Result;
use crate::models::{
    CheckoutTransaction, CryptoDetails, CryptoStatus, InitiationResult, VerifyQrRequest,
    VerifyQrResponse,
};
use crate::services::api_client::ApiClient;
use crate::utils::constants::CRYPTO_METHOD;

/// Checkout endpoints of the PSP
#[derive(Clone)]
pub struct PaymentService {
    client: ApiClient,
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl PaymentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_checkout(&self, transaction_id: &str) -> Result<CheckoutTransaction> {
        log::info!("💳 Loading checkout {}", transaction_id);
        let mut transaction: CheckoutTransaction = self
            .client
            .get_json(&format!("/api/payments/{}", segment(transaction_id)))
            .await?;
        transaction.id = transaction_id.to_string();
        log::info!(
            "✅ Checkout {}: {} {} ({} methods)",
            transaction_id,
            transaction.amount,
            transaction.currency,
            transaction.available_methods.len()
        );
        Ok(transaction)
    }

    /// Starts a payment and validates the response shape
    pub async fn initiate(&self, transaction_id: &str, method: &str) -> Result<InitiationResult> {
        log::info!("🚀 Initiating {} for {}", method, transaction_id);
        let path = format!(
            "/api/payments/checkout/{}/init/{}",
            segment(transaction_id),
            segment(method)
        );
        let response = self.client.post_empty(&path).await?;
        InitiationResult::from_body(&response.body)
    }

    pub async fn verify_qr(&self, transaction_id: &str, scanned: &str) -> Result<VerifyQrResponse> {
        let path = format!("/api/payments/checkout/{}/verify-qr", segment(transaction_id));
        let body = VerifyQrRequest {
            scanned_string: scanned.to_string(),
        };
        self.client.post_json(&path, &body).await
    }

    pub async fn crypto_details(&self, transaction_id: &str) -> Result<CryptoDetails> {
        self.client
            .get_json(&format!(
                "/api/payments/checkout/{}/{}/details",
                segment(transaction_id),
                CRYPTO_METHOD
            ))
            .await
    }

    pub async fn crypto_status(&self, transaction_id: &str) -> Result<CryptoStatus> {
        self.client
            .get_json(&format!(
                "/api/payments/checkout/{}/{}/status",
                segment(transaction_id),
                CRYPTO_METHOD
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::testing::ScriptedTransport;
    use futures::executor::block_on;
    use std::rc::Rc;

    fn service() -> (PaymentService, Rc<ScriptedTransport>) {
        let transport = Rc::new(ScriptedTransport::new());
        (
            PaymentService::new(ApiClient::new("http://psp", transport.clone())),
            transport,
        )
    }

    #[test]
    fn checkout_id_comes_from_the_request() {
        let (payments, transport) = service();
        transport.reply(200, r#"{"amount":10,"currency":"RSD","merchantId":"m","availableMethods":[]}"#);
        let tx = block_on(payments.get_checkout("abc")).unwrap();
        assert_eq!(tx.id, "abc");
        assert_eq!(transport.last_request().unwrap().url, "http://psp/api/payments/abc");
    }

    #[test]
    fn initiate_posts_to_method_path() {
        let (payments, transport) = service();
        transport.reply(200, r#"{"qrData":"NBS"}"#);
        let result = block_on(payments.initiate("abc", "QR")).unwrap();
        assert_eq!(result, InitiationResult::DisplayCode { qr_data: "NBS".to_string() });
        assert_eq!(
            transport.last_request().unwrap().url,
            "http://psp/api/payments/checkout/abc/init/QR"
        );
    }

    #[test]
    fn initiate_surfaces_http_errors() {
        let (payments, transport) = service();
        transport.reply(503, r#"{"retryable":true,"error":"Bank down"}"#);
        assert_eq!(
            block_on(payments.initiate("abc", "CARD")),
            Err(ApiError::ServiceUnavailable { message: "Bank down".to_string(), retryable: true })
        );
    }

    #[test]
    fn verify_qr_sends_scanned_string() {
        let (payments, transport) = service();
        transport.reply(200, r#"{"redirectUrl":"http://shop/success"}"#);
        let result = block_on(payments.verify_qr("abc", "NBS")).unwrap();
        assert_eq!(result.completion_url(), Some("http://shop/success"));
        assert_eq!(
            transport.last_request().unwrap().body.as_deref(),
            Some(r#"{"scannedString":"NBS"}"#)
        );
    }
}
