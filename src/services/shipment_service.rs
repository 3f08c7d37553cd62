use chrono::{DateTime, Utc};

use crate::db::ShipmentStore;
use crate::error::{AppError, Result};
use crate::models::shipment::{validate_line_items, LineItemInput, ShipmentInput, ShipmentPatch};
use crate::tracking::status::ensure_editable;
use crate::tracking::TrackedShipment;

/// Shipment mutations, gated on the shipment not having departed yet.
/// The store re-checks the gate inside the write transaction.
pub struct ShipmentService {
    store: ShipmentStore,
}

impl ShipmentService {
    pub fn new(store: ShipmentStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> Result<TrackedShipment> {
        let shipment = self.store.get_by_id(id).await?;
        Ok(TrackedShipment::new(shipment, now))
    }

    pub async fn create(&self, input: ShipmentInput, now: DateTime<Utc>) -> Result<String> {
        let input = input.validated()?;
        self.store
            .create(&input, now)
            .await
            .map_err(unknown_reference)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: ShipmentPatch,
        now: DateTime<Utc>,
    ) -> Result<TrackedShipment> {
        let current = self.store.get_by_id(id).await?;
        ensure_editable(&current, now)?;

        let update = patch.merge(&current)?;
        self.store
            .update(id, &update, now)
            .await
            .map_err(unknown_reference)?;

        self.get(id, now).await
    }

    pub async fn replace_line_items(
        &self,
        id: &str,
        items: Vec<LineItemInput>,
        now: DateTime<Utc>,
    ) -> Result<TrackedShipment> {
        let items = validate_line_items(items)?;
        self.store
            .replace_line_items(id, &items, now)
            .await
            .map_err(unknown_reference)?;
        self.get(id, now).await
    }

    /// Cancel a shipment that has not departed yet
    pub async fn delete(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        self.store.delete(id, now).await
    }
}

// Inserting a row that points at a missing client, carrier or product is a
// user input problem, not a server fault.
fn unknown_reference(err: AppError) -> AppError {
    if err.is_foreign_key_violation() {
        AppError::validation("The selected client, carrier or product does not exist")
    } else {
        err
    }
}
