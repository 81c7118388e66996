use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub name: String,
    #[serde(default)]
    pub service_url: Option<String>,
}

impl PaymentMethod {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            service_url: None,
        }
    }
}

/// Older backends list methods as bare names
#[derive(Deserialize)]
#[serde(untagged)]
enum MethodEntry {
    Name(String),
    Full(PaymentMethod),
}

fn method_list<'de, D>(deserializer: D) -> std::result::Result<Vec<PaymentMethod>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<MethodEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            MethodEntry::Name(name) => PaymentMethod::named(&name),
            MethodEntry::Full(method) => method,
        })
        .collect())
}

/// Checkout page data, read-only for the client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTransaction {
    /// Taken from the URL; the backend does not echo it
    #[serde(default)]
    pub id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default, deserialize_with = "method_list")]
    pub available_methods: Vec<PaymentMethod>,
}

impl CheckoutTransaction {
    pub fn method(&self, name: &str) -> Option<&PaymentMethod> {
        self.available_methods.iter().find(|m| m.name == name)
    }
}

/// Validated initiation response
#[derive(Clone, Debug, PartialEq)]
pub enum InitiationResult {
    Redirect { payment_url: String },
    DisplayCode { qr_data: String },
    Failed { error: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInitiation {
    #[serde(default)]
    payment_url: Option<String>,
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default)]
    qr_data: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn redirect(url: String) -> Result<InitiationResult> {
    if url.starts_with("http") {
        Ok(InitiationResult::Redirect { payment_url: url })
    } else {
        Err(ApiError::UnexpectedShape(format!(
            "payment URL is not absolute: {}",
            url
        )))
    }
}

impl InitiationResult {
    /// Classifies a 2xx initiation body.
    ///
    /// Accepts `{paymentUrl}` (or `{redirectUrl}`), `{qrData}`, `{error}` and a
    /// bare URL string; anything else is rejected.
    pub fn from_body(body: &str) -> Result<Self> {
        let trimmed = body.trim();
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Object(_)) => {
                let raw: RawInitiation = serde_json::from_str(trimmed)
                    .map_err(|e| ApiError::UnexpectedShape(e.to_string()))?;
                if let Some(error) = non_empty(raw.error) {
                    return Ok(InitiationResult::Failed { error });
                }
                if let Some(url) = non_empty(raw.payment_url).or_else(|| non_empty(raw.redirect_url)) {
                    return redirect(url);
                }
                if let Some(qr_data) = non_empty(raw.qr_data) {
                    return Ok(InitiationResult::DisplayCode { qr_data });
                }
                Err(ApiError::UnexpectedShape(
                    "no paymentUrl, qrData or error field".to_string(),
                ))
            }
            Ok(serde_json::Value::String(url)) => redirect(url),
            Ok(other) => Err(ApiError::UnexpectedShape(other.to_string())),
            Err(_) if trimmed.starts_with("http") => redirect(trimmed.to_string()),
            Err(_) => Err(ApiError::UnexpectedShape(trimmed.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQrRequest {
    pub scanned_string: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQrResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerifyQrResponse {
    /// Where to send the payer once the scan is accepted
    pub fn completion_url(&self) -> Option<&str> {
        [&self.redirect_url, &self.payment_url]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|url| !url.trim().is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoDetails {
    #[serde(default, deserialize_with = "string_or_number")]
    pub btc_amount: String,
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub qr_code_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoStatus {
    #[serde(default)]
    pub redirect_url: Option<String>,
}
