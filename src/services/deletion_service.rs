use chrono::{DateTime, Utc};

use crate::db::{CarrierStore, ClientStore, ProductStore, ShipmentStore};
use crate::error::{AppError, Result};
use crate::models::shipment::{BlockingShipment, Shipment};
use crate::tracking::status::derive_status;

/// Kind of record a shipment can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Referenced {
    Client,
    Carrier,
    Product,
}

impl Referenced {
    pub fn entity(self) -> &'static str {
        match self {
            Referenced::Client => "client",
            Referenced::Carrier => "carrier",
            Referenced::Product => "product",
        }
    }

    fn is_referenced_by(self, id: &str, shipment: &Shipment) -> bool {
        match self {
            Referenced::Client => shipment.client_id == id,
            Referenced::Carrier => shipment.carrier_id == id,
            Referenced::Product => shipment.references_product(id),
        }
    }
}

/// Deletes clients, carriers and products. When the store refuses because a
/// shipment still points at the record, the error carries those shipments so
/// the user can cancel them first.
pub struct DeletionService {
    clients: ClientStore,
    carriers: CarrierStore,
    products: ProductStore,
    shipments: ShipmentStore,
}

impl DeletionService {
    pub fn new(
        clients: ClientStore,
        carriers: CarrierStore,
        products: ProductStore,
        shipments: ShipmentStore,
    ) -> Self {
        Self {
            clients,
            carriers,
            products,
            shipments,
        }
    }

    pub async fn delete(&self, kind: Referenced, id: &str, now: DateTime<Utc>) -> Result<()> {
        let result = match kind {
            Referenced::Client => self.clients.delete(id).await,
            Referenced::Carrier => self.carriers.delete(id).await,
            Referenced::Product => self.products.delete(id).await,
        };

        match result {
            Err(err) if err.is_foreign_key_violation() => {
                tracing::warn!(
                    "Deleting {} {} refused, still referenced by shipments",
                    kind.entity(),
                    id
                );
                let blocking = match self.blocking_shipments(kind, id, now).await {
                    Ok(blocking) => blocking,
                    Err(e) => {
                        tracing::error!("Failed to fetch shipments blocking {}: {}", id, e);
                        Vec::new()
                    }
                };
                Err(AppError::StillReferenced {
                    entity: kind.entity(),
                    blocking,
                })
            }
            other => other,
        }
    }

    /// Shipments currently pointing at the given record
    pub async fn blocking_shipments(
        &self,
        kind: Referenced,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<BlockingShipment>> {
        let shipments = self.shipments.fetch_all().await?;

        Ok(shipments
            .into_iter()
            .filter(|shipment| kind.is_referenced_by(id, shipment))
            .map(|shipment| BlockingShipment {
                status: derive_status(&shipment, now),
                id: shipment.id,
                name: shipment.name,
            })
            .collect())
    }
}
