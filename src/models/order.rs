use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::catalog::humanize;
use crate::utils::constants::ORDER_CURRENCY;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Vehicle,
    Insurance,
    Equipment,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Vehicle => "VEHICLE",
            OrderType::Insurance => "INSURANCE",
            OrderType::Equipment => "EQUIPMENT",
        }
    }
}

/// Backend-owned order status. Unknown values are kept verbatim for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
    Error,
    Other(String),
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => OrderStatus::Pending,
            "CONFIRMED" => OrderStatus::Confirmed,
            "CANCELLED" => OrderStatus::Cancelled,
            "ERROR" => OrderStatus::Error,
            _ => OrderStatus::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Error => "ERROR",
            OrderStatus::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Error => "Error",
            OrderStatus::Other(raw) => raw,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Error)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub vehicle_id: Option<i64>,
    #[serde(default)]
    pub insurance_id: Option<i64>,
    #[serde(default)]
    pub equipment_id: Option<i64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub price_per_day: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub currency: String,
    pub order_status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    pub vehicle_image_url: Option<String>,
    #[serde(default)]
    pub equipment_type: Option<String>,
    #[serde(default)]
    pub insurance_type: Option<String>,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
    #[serde(default)]
    pub psp_payment_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: Option<OrderStatus>,
    #[serde(default, alias = "isActive")]
    pub active: Option<bool>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Name shown in the order history list
    pub fn service_name(&self) -> String {
        match self.order_type {
            OrderType::Vehicle => self.vehicle_model.clone(),
            OrderType::Equipment => self.equipment_type.as_deref().map(humanize),
            OrderType::Insurance => self
                .insurance_type
                .as_deref()
                .map(|kind| format!("{} Insurance", kind)),
        }
        .unwrap_or_else(|| self.order_type.as_str().to_string())
    }

    /// A pending order with a PSP payment can be resumed on the checkout page
    pub fn resumable_payment(&self) -> Option<&str> {
        match self.order_status {
            OrderStatus::Pending => self.psp_payment_id.as_deref().filter(|id| !id.is_empty()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub currency: String,
}

fn iso(moment: DateTime<Utc>) -> String {
    moment.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl OrderRequest {
    fn empty() -> Self {
        Self {
            vehicle_id: None,
            insurance_id: None,
            equipment_id: None,
            start_date: None,
            end_date: None,
            currency: ORDER_CURRENCY.to_string(),
        }
    }

    pub fn vehicle(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            vehicle_id: Some(id),
            start_date: Some(iso(start)),
            end_date: Some(iso(end)),
            ..Self::empty()
        }
    }

    pub fn equipment(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            equipment_id: Some(id),
            start_date: Some(iso(start)),
            end_date: Some(iso(end)),
            ..Self::empty()
        }
    }

    pub fn insurance(id: i64) -> Self {
        Self {
            insurance_id: Some(id),
            ..Self::empty()
        }
    }
}

/// `GET /orders/status` body
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub order_status: OrderStatus,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
}
