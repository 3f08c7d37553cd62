pub mod carriers;
pub mod clients;
pub mod extract;
pub mod products;
pub mod shipments;
pub mod ws;

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::{
    db::{CarrierStore, ClientStore, DbPool, ProductStore, ShipmentStore},
    error::Result,
    models::Notification,
    services::{DashboardService, DeletionService, ShipmentService},
    ws::{ConnectionManager, DefaultMessageRouter, MessageRouter, SharedConnectionManager},
};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub clients: ClientStore,
    pub carriers: CarrierStore,
    pub products: ProductStore,
    pub shipments: Arc<ShipmentService>,
    pub dashboard: Arc<DashboardService>,
    pub deletion: Arc<DeletionService>,
    pub connection_manager: SharedConnectionManager,
    pub message_router: Arc<dyn MessageRouter>,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        let clients = ClientStore::new(pool.clone());
        let carriers = CarrierStore::new(pool.clone());
        let products = ProductStore::new(pool.clone());
        let shipment_store = ShipmentStore::new(pool);

        Self {
            shipments: Arc::new(ShipmentService::new(shipment_store.clone())),
            dashboard: Arc::new(DashboardService::new(
                shipment_store.clone(),
                clients.clone(),
                carriers.clone(),
            )),
            deletion: Arc::new(DeletionService::new(
                clients.clone(),
                carriers.clone(),
                products.clone(),
                shipment_store,
            )),
            clients,
            carriers,
            products,
            connection_manager: Arc::new(ConnectionManager::new()),
            message_router: Arc::new(DefaultMessageRouter::new()),
        }
    }

    /// Tell connected dashboards how a mutation went, then hand the result back
    pub async fn report<T>(&self, result: Result<T>, success: impl Into<String>) -> Result<T> {
        let notification = match &result {
            Ok(_) => Notification::success(success),
            Err(err) => Notification::error(err.public_message()),
        };
        self.connection_manager.notify(notification).await;
        result
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .route("/api/dashboard", get(shipments::dashboard))
        .route(
            "/api/shipments",
            get(shipments::list_shipments).post(shipments::create_shipment),
        )
        .route(
            "/api/shipments/{id}",
            get(shipments::get_shipment)
                .patch(shipments::update_shipment)
                .delete(shipments::delete_shipment),
        )
        .route(
            "/api/shipments/{id}/line-items",
            put(shipments::replace_line_items),
        )
        .route(
            "/api/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/api/carriers",
            get(carriers::list_carriers).post(carriers::create_carrier),
        )
        .route(
            "/api/carriers/{id}",
            get(carriers::get_carrier)
                .put(carriers::update_carrier)
                .delete(carriers::delete_carrier),
        )
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "Shipment tracking server is running."
}
