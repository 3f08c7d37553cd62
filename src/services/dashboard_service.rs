use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{CarrierStore, ClientStore, ShipmentStore};
use crate::error::Result;
use crate::models::{carrier::Carrier, client::Client};
use crate::tracking::{annotate, project, ProjectionParams, TrackedShipment};

/// Everything the shipment dashboard renders in one response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub shipments: Vec<TrackedShipment>,
    pub clients: Vec<Client>,
    pub carriers: Vec<Carrier>,
    /// Number of shipments before filtering
    pub total: usize,
}

pub struct DashboardService {
    shipments: ShipmentStore,
    clients: ClientStore,
    carriers: CarrierStore,
}

impl DashboardService {
    pub fn new(shipments: ShipmentStore, clients: ClientStore, carriers: CarrierStore) -> Self {
        Self {
            shipments,
            clients,
            carriers,
        }
    }

    /// Fetch the three collections concurrently, then derive and project
    pub async fn load(&self, params: &ProjectionParams, now: DateTime<Utc>) -> Result<DashboardView> {
        let (shipments, clients, carriers) = tokio::try_join!(
            self.shipments.fetch_all(),
            self.clients.fetch_all(),
            self.carriers.fetch_all(),
        )?;

        let total = shipments.len();
        let tracked = annotate(shipments, now);
        let shipments = project(&tracked, params);
        tracing::debug!(
            "Dashboard projected {} of {} shipments",
            shipments.len(),
            total
        );

        Ok(DashboardView {
            shipments,
            clients,
            carriers,
            total,
        })
    }

    /// Projected shipment list without the side collections
    pub async fn list(
        &self,
        params: &ProjectionParams,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrackedShipment>> {
        let tracked = annotate(self.shipments.fetch_all().await?, now);
        Ok(project(&tracked, params))
    }
}
