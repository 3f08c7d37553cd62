use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};
use crate::models::client::non_blank;
use crate::models::relation::{deserialize_related, RelatedName};
use crate::tracking::status::Status;

/// One logistics movement, as fetched with its nested relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub departure_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub arrival_date: Option<DateTime<Utc>>,
    pub client_id: String,
    pub carrier_id: String,
    #[serde(default, deserialize_with = "deserialize_related")]
    pub client: Option<RelatedName>,
    #[serde(default, deserialize_with = "deserialize_related")]
    pub carrier: Option<RelatedName>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Shipment {
    pub fn client_name(&self) -> &str {
        self.client.as_ref().map(|c| c.name.as_str()).unwrap_or("")
    }

    pub fn carrier_name(&self) -> &str {
        self.carrier.as_ref().map(|c| c.name.as_str()).unwrap_or("")
    }

    pub fn references_product(&self, product_id: &str) -> bool {
        self.line_items.iter().any(|item| item.product_id == product_id)
    }
}

/// Product and quantity attached to a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product_id: String,
    pub quantity: u32,
}

/// Payload for creating a shipment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    pub client_id: String,
    pub carrier_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub departure_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub arrival_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

impl ShipmentInput {
    pub fn validated(self) -> Result<Self> {
        let client_id = self.client_id.trim().to_string();
        let carrier_id = self.carrier_id.trim().to_string();
        ensure_parties(&client_id, &carrier_id)?;
        ensure_date_order(self.departure_date, self.arrival_date)?;
        let line_items = validate_line_items(self.line_items)?;

        Ok(Self {
            client_id,
            carrier_id,
            name: non_blank(self.name),
            departure_date: self.departure_date,
            arrival_date: self.arrival_date,
            line_items,
        })
    }
}

/// Partial update; absent fields keep their stored value. Date fields accept
/// an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub name: Option<Option<String>>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub carrier_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub departure_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub arrival_date: Option<Option<DateTime<Utc>>>,
}

/// Full set of mutable shipment columns after a patch was merged
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentUpdate {
    pub name: Option<String>,
    pub client_id: String,
    pub carrier_id: String,
    pub departure_date: Option<DateTime<Utc>>,
    pub arrival_date: Option<DateTime<Utc>>,
}

impl ShipmentPatch {
    /// Merge onto the stored shipment and validate the result
    pub fn merge(self, current: &Shipment) -> Result<ShipmentUpdate> {
        let update = ShipmentUpdate {
            name: match self.name {
                Some(name) => non_blank(name),
                None => current.name.clone(),
            },
            client_id: self
                .client_id
                .map(|id| id.trim().to_string())
                .unwrap_or_else(|| current.client_id.clone()),
            carrier_id: self
                .carrier_id
                .map(|id| id.trim().to_string())
                .unwrap_or_else(|| current.carrier_id.clone()),
            departure_date: self.departure_date.unwrap_or(current.departure_date),
            arrival_date: self.arrival_date.unwrap_or(current.arrival_date),
        };

        ensure_parties(&update.client_id, &update.carrier_id)?;
        ensure_date_order(update.departure_date, update.arrival_date)?;
        Ok(update)
    }
}

/// Shipment preventing the deletion of a client, carrier or product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingShipment {
    pub id: String,
    pub name: Option<String>,
    pub status: Status,
}

pub fn validate_line_items(items: Vec<LineItemInput>) -> Result<Vec<LineItemInput>> {
    items
        .into_iter()
        .map(|item| {
            let product_id = item.product_id.trim().to_string();
            if product_id.is_empty() || item.quantity == 0 {
                return Err(AppError::validation(
                    "Each line item needs a product and a quantity greater than zero",
                ));
            }
            Ok(LineItemInput {
                product_id,
                quantity: item.quantity,
            })
        })
        .collect()
}

fn ensure_parties(client_id: &str, carrier_id: &str) -> Result<()> {
    if client_id.is_empty() || carrier_id.is_empty() {
        return Err(AppError::validation(
            "A shipment needs both a client and a carrier",
        ));
    }
    Ok(())
}

fn ensure_date_order(
    departure: Option<DateTime<Utc>>,
    arrival: Option<DateTime<Utc>>,
) -> Result<()> {
    if let (Some(departure), Some(arrival)) = (departure, arrival) {
        if arrival < departure {
            return Err(AppError::validation(
                "The arrival date cannot be earlier than the departure date",
            ));
        }
    }
    Ok(())
}

fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
