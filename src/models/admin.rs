use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Merchant as listed on the PSP dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub merchant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_shop_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantCreateRequest {
    pub name: String,
    pub web_shop_url: String,
}

/// Returned once on merchant creation; the password is never shown again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantCredentials {
    pub merchant_id: String,
    pub merchant_password: String,
}

/// Payment method registered in the PSP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub service_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentMethod {
    pub name: String,
    pub service_url: String,
}

/// A merchant's subscription to one payment method
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub id: Option<i64>,
    pub payment_method: PaymentMethodRecord,
    #[serde(default)]
    pub credentials_json: Option<String>,
    #[serde(default, alias = "isActive")]
    pub active: Option<bool>,
}

impl Subscription {
    /// Credentials stored as a JSON object string. Non-string values are
    /// stringified; anything unparsable yields an empty map.
    pub fn credentials(&self) -> BTreeMap<String, String> {
        let raw = match self.credentials_json.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return BTreeMap::new(),
        };
        match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
            Ok(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, text)
                })
                .collect(),
            Err(e) => {
                log::warn!(
                    "⚠️ Unreadable credentials for {}: {}",
                    self.payment_method.name,
                    e
                );
                BTreeMap::new()
            }
        }
    }
}

/// One entry of `POST /api/admin/merchants/{id}/services`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantServiceConfig {
    pub method_name: String,
    pub credentials: BTreeMap<String, String>,
}

/// Per-method toggle on the merchant details page
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MethodSelection {
    pub method_name: String,
    pub enabled: bool,
    pub credentials: BTreeMap<String, String>,
}

/// Builds one selection per global method, in method-list order, enabling
/// those the merchant is subscribed to. Subscriptions to methods that no
/// longer exist are ignored.
pub fn build_selections(
    methods: &[PaymentMethodRecord],
    subscriptions: &[Subscription],
) -> Vec<MethodSelection> {
    let mut selections: Vec<MethodSelection> = methods
        .iter()
        .map(|method| MethodSelection {
            method_name: method.name.clone(),
            ..MethodSelection::default()
        })
        .collect();

    for subscription in subscriptions {
        if let Some(selection) = selections
            .iter_mut()
            .find(|s| s.method_name == subscription.payment_method.name)
        {
            selection.enabled = true;
            selection.credentials = subscription.credentials();
        }
    }
    selections
}

/// Only enabled selections are sent
pub fn configs_to_save(selections: &[MethodSelection]) -> Vec<MerchantServiceConfig> {
    selections
        .iter()
        .filter(|s| s.enabled)
        .map(|s| MerchantServiceConfig {
            method_name: s.method_name.clone(),
            credentials: s.credentials.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str) -> PaymentMethodRecord {
        PaymentMethodRecord {
            id: None,
            name: name.to_string(),
            service_url: format!("http://{}", name.to_lowercase()),
        }
    }

    #[test]
    fn selections_follow_method_list_and_subscriptions() {
        let methods = vec![method("CARD"), method("QR"), method("PAYPAL")];
        let subs: Vec<Subscription> = serde_json::from_str(
            r#"[{"id":1,"paymentMethod":{"name":"QR"},"credentialsJson":"{\"account\":\"840-1\",\"pin\":42}"},
                {"id":2,"paymentMethod":{"name":"GONE"},"credentialsJson":null}]"#,
        )
        .unwrap();

        let selections = build_selections(&methods, &subs);
        assert_eq!(selections.len(), 3);
        assert!(!selections[0].enabled);
        assert!(selections[1].enabled);
        assert_eq!(selections[1].credentials.get("account").map(String::as_str), Some("840-1"));
        assert_eq!(selections[1].credentials.get("pin").map(String::as_str), Some("42"));

        let configs = configs_to_save(&selections);
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].method_name, "QR");
    }

    #[test]
    fn broken_credentials_json_is_empty() {
        let sub = Subscription {
            id: None,
            payment_method: method("CARD"),
            credentials_json: Some("{not json".to_string()),
            active: None,
        };
        assert!(sub.credentials().is_empty());
    }
}
