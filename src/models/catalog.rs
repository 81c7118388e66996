use serde::{Deserialize, Serialize};

// Backends disagree on the availability flag name, so both are kept
// and `is_available()` reads `isAvailable` first.

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub model: String,
    pub price_per_day: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.is_available.or(self.available).unwrap_or(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentType {
    ChildSeat,
    Gps,
    TollCard,
    SnowChains,
}

impl EquipmentType {
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentType::ChildSeat => "Child Seat",
            EquipmentType::Gps => "GPS",
            EquipmentType::TollCard => "Toll Card",
            EquipmentType::SnowChains => "Snow Chains",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub price_per_day: f64,
    pub equipment_type: EquipmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl Equipment {
    pub fn is_available(&self) -> bool {
        self.is_available.or(self.available).unwrap_or(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsuranceType {
    Basic,
    Full,
    Premium,
}

impl InsuranceType {
    pub fn label(&self) -> &'static str {
        match self {
            InsuranceType::Basic => "Basic",
            InsuranceType::Full => "Full",
            InsuranceType::Premium => "Premium",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insurance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub price: f64,
    #[serde(rename = "type")]
    pub insurance_type: InsuranceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl Insurance {
    pub fn is_available(&self) -> bool {
        self.is_available.or(self.available).unwrap_or(false)
    }
}

/// Turns a `SCREAMING_SNAKE` backend value into words ("SNOW_CHAINS" -> "SNOW CHAINS")
pub fn humanize(raw: &str) -> String {
    raw.replace('_', " ")
}
