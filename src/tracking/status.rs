use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::shipment::Shipment;

/// Lifecycle stage of a shipment, always derived from its dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotDeparted,
    InTransit,
    Delivered,
}

impl Status {
    /// Sort priority: not departed first, delivered last
    pub fn rank(self) -> u8 {
        match self {
            Status::NotDeparted => 0,
            Status::InTransit => 1,
            Status::Delivered => 2,
        }
    }

    /// Only shipments that have not left yet may be edited or cancelled
    pub fn is_editable(self) -> bool {
        self == Status::NotDeparted
    }
}

/// A date counts only once it has been reached: an arrival planned for next
/// week does not make the shipment delivered today.
pub fn derive_status(shipment: &Shipment, now: DateTime<Utc>) -> Status {
    let reached = |date: Option<DateTime<Utc>>| date.is_some_and(|d| d <= now);

    if reached(shipment.arrival_date) {
        Status::Delivered
    } else if reached(shipment.departure_date) {
        Status::InTransit
    } else {
        Status::NotDeparted
    }
}

/// Not departed yet, but a departure date in the future is already set
pub fn is_departure_planned(shipment: &Shipment, now: DateTime<Utc>) -> bool {
    derive_status(shipment, now) == Status::NotDeparted
        && shipment.departure_date.is_some_and(|d| d > now)
}

/// Reject modifications of shipments that already shipped or were delivered
pub fn ensure_editable(shipment: &Shipment, now: DateTime<Utc>) -> Result<()> {
    if derive_status(shipment, now).is_editable() {
        Ok(())
    } else {
        Err(AppError::ShipmentLocked)
    }
}
