use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, Result};
use crate::models::client::non_blank;

/// Transport company responsible for a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierInput {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
}

impl CarrierInput {
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Carrier name is required"));
        }

        Ok(Self {
            name,
            contact: non_blank(self.contact),
        })
    }
}
