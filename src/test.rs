use crate::db::{self, CarrierStore, ClientStore, DbPool, ProductStore, ShipmentStore};
use crate::error::AppError;
use crate::handlers::{self, AppState};
use crate::models::carrier::CarrierInput;
use crate::models::client::ClientInput;
use crate::models::product::ProductInput;
use crate::models::shipment::{LineItemInput, ShipmentInput, ShipmentPatch, ShipmentUpdate};
use crate::services::deletion_service::Referenced;
use crate::services::{DashboardService, DeletionService, ShipmentService};
use crate::tracking::{ProjectionParams, Status};

use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

// Helper function to set up a test database in its own file
async fn setup_test_db() -> (PathBuf, DbPool) {
    let db_path = std::env::temp_dir().join(format!("chargement_test_{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", db_path.display());

    let pool = db::init_db_pool(&url, 2)
        .await
        .expect("Failed to initialize database");

    (db_path, pool)
}

// Helper function to clean up a test database
async fn teardown_test_db(db_path: PathBuf, pool: DbPool) {
    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut path = db_path.clone().into_os_string();
        path.push(suffix);
        let _ = fs::remove_file(path);
    }
}

struct Fixture {
    client_id: String,
    carrier_id: String,
    product_id: String,
}

// Helper function to create one client, carrier and product
async fn create_parties(pool: &DbPool) -> Fixture {
    let client = ClientStore::new(pool.clone())
        .create(ClientInput {
            name: "Acme Corp".to_string(),
            address: None,
        })
        .await
        .expect("Failed to create client");
    let carrier = CarrierStore::new(pool.clone())
        .create(CarrierInput {
            name: "Transports Martin".to_string(),
            contact: None,
        })
        .await
        .expect("Failed to create carrier");
    let product = ProductStore::new(pool.clone())
        .create(ProductInput {
            name: "Euro pallet".to_string(),
            description: None,
        })
        .await
        .expect("Failed to create product");

    Fixture {
        client_id: client.id,
        carrier_id: carrier.id,
        product_id: product.id,
    }
}

fn shipment_input(
    fixture: &Fixture,
    name: &str,
    departure_date: Option<DateTime<Utc>>,
    arrival_date: Option<DateTime<Utc>>,
) -> ShipmentInput {
    ShipmentInput {
        client_id: fixture.client_id.clone(),
        carrier_id: fixture.carrier_id.clone(),
        name: Some(name.to_string()),
        departure_date,
        arrival_date,
        line_items: vec![LineItemInput {
            product_id: fixture.product_id.clone(),
            quantity: 12,
        }],
    }
}

async fn line_item_count(pool: &DbPool, shipment_id: &str) -> i64 {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM shipment_line_items WHERE shipment_id = ?")
            .bind(shipment_id)
            .fetch_one(pool)
            .await
            .expect("Failed to count line items");
    count.0
}

#[cfg(test)]
mod store_tests {
    use super::*;

    #[tokio::test]
    async fn test_client_crud() {
        let (db_path, pool) = setup_test_db().await;
        let store = ClientStore::new(pool.clone());

        let created = store
            .create(ClientInput {
                name: "  Dupont & Fils ".to_string(),
                address: Some("".to_string()),
            })
            .await
            .expect("Failed to create client");
        assert_eq!(created.name, "Dupont & Fils");
        assert_eq!(created.address, None);

        store
            .create(ClientInput {
                name: "acme".to_string(),
                address: None,
            })
            .await
            .expect("Failed to create client");

        let names: Vec<String> = store
            .fetch_all()
            .await
            .expect("Failed to list clients")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["acme", "Dupont & Fils"]);

        let updated = store
            .update(
                &created.id,
                ClientInput {
                    name: "Dupont SA".to_string(),
                    address: Some("Rouen".to_string()),
                },
            )
            .await
            .expect("Failed to update client");
        assert_eq!(updated.name, "Dupont SA");
        assert_eq!(updated.address.as_deref(), Some("Rouen"));

        store.delete(&created.id).await.expect("Failed to delete client");
        assert!(matches!(
            store.get_by_id(&created.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&created.id).await,
            Err(AppError::NotFound { .. })
        ));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let (db_path, pool) = setup_test_db().await;

        let result = CarrierStore::new(pool.clone())
            .create(CarrierInput {
                name: "   ".to_string(),
                contact: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_shipment_is_fetched_with_relations() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let store = ShipmentStore::new(pool.clone());

        let id = store
            .create(&shipment_input(&fixture, "Spring order", None, None), Utc::now())
            .await
            .expect("Failed to create shipment");

        let shipment = store.get_by_id(&id).await.expect("Failed to fetch shipment");
        assert_eq!(shipment.name.as_deref(), Some("Spring order"));
        assert_eq!(shipment.client_name(), "Acme Corp");
        assert_eq!(shipment.carrier_name(), "Transports Martin");
        assert_eq!(shipment.line_items.len(), 1);
        assert_eq!(shipment.line_items[0].quantity, 12);
        assert_eq!(
            shipment.line_items[0].product_name.as_deref(),
            Some("Euro pallet")
        );

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_fetch_all_is_newest_first() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let store = ShipmentStore::new(pool.clone());
        let now = Utc::now();

        let older = store
            .create(&shipment_input(&fixture, "Older", None, None), now - Duration::days(2))
            .await
            .unwrap();
        let newer = store
            .create(&shipment_input(&fixture, "Newer", None, None), now)
            .await
            .unwrap();

        let ids: Vec<String> = store
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![newer, older]);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_delete_shipment_removes_line_items() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let store = ShipmentStore::new(pool.clone());

        let id = store
            .create(&shipment_input(&fixture, "To cancel", None, None), Utc::now())
            .await
            .unwrap();
        assert_eq!(line_item_count(&pool, &id).await, 1);

        store.delete(&id, Utc::now()).await.expect("Failed to delete shipment");
        assert_eq!(line_item_count(&pool, &id).await, 0);
        assert!(matches!(
            store.get_by_id(&id).await,
            Err(AppError::NotFound { .. })
        ));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_replace_line_items_replaces_the_whole_set() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let store = ShipmentStore::new(pool.clone());
        let crate_product = ProductStore::new(pool.clone())
            .create(ProductInput {
                name: "Wooden crate".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let id = store
            .create(&shipment_input(&fixture, "Restock", None, None), Utc::now())
            .await
            .unwrap();

        store
            .replace_line_items(
                &id,
                &[
                    LineItemInput {
                        product_id: crate_product.id.clone(),
                        quantity: 3,
                    },
                    LineItemInput {
                        product_id: fixture.product_id.clone(),
                        quantity: 1,
                    },
                ],
                Utc::now(),
            )
            .await
            .expect("Failed to replace line items");

        let shipment = store.get_by_id(&id).await.unwrap();
        let items: Vec<(String, u32)> = shipment
            .line_items
            .into_iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();
        assert_eq!(
            items,
            vec![(crate_product.id, 3), (fixture.product_id.clone(), 1)]
        );

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_store_checks_departure_at_write_time() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let store = ShipmentStore::new(pool.clone());
        let now = Utc::now();

        let id = store
            .create(
                &shipment_input(&fixture, "Leaves soon", Some(now + Duration::hours(1)), None),
                now,
            )
            .await
            .unwrap();
        let update = ShipmentUpdate {
            name: Some("Renamed".to_string()),
            client_id: fixture.client_id.clone(),
            carrier_id: fixture.carrier_id.clone(),
            departure_date: Some(now + Duration::hours(1)),
            arrival_date: None,
        };

        // By the time the write runs the truck has left
        let later = now + Duration::hours(2);
        assert!(matches!(
            store.update(&id, &update, later).await,
            Err(AppError::ShipmentLocked)
        ));
        assert!(matches!(
            store.replace_line_items(&id, &[], later).await,
            Err(AppError::ShipmentLocked)
        ));
        assert!(matches!(
            store.delete(&id, later).await,
            Err(AppError::ShipmentLocked)
        ));

        let stored = store.get_by_id(&id).await.unwrap();
        assert_eq!(stored.name.as_deref(), Some("Leaves soon"));
        assert_eq!(line_item_count(&pool, &id).await, 1);

        store.update(&id, &update, now).await.expect("Failed to update shipment");
        assert_eq!(
            store.get_by_id(&id).await.unwrap().name.as_deref(),
            Some("Renamed")
        );

        assert!(matches!(
            store.delete("missing", now).await,
            Err(AppError::NotFound { .. })
        ));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_seed_sample_data_runs_once() {
        let (db_path, pool) = setup_test_db().await;

        db::seed_sample_data(&pool).await.expect("Failed to seed");
        db::seed_sample_data(&pool).await.expect("Failed to reseed");

        let shipments = ShipmentStore::new(pool.clone()).fetch_all().await.unwrap();
        assert_eq!(shipments.len(), 3);
        assert_eq!(ClientStore::new(pool.clone()).fetch_all().await.unwrap().len(), 2);

        teardown_test_db(db_path, pool).await;
    }
}

#[cfg(test)]
mod service_tests {
    use super::*;

    fn services(pool: &DbPool) -> (ShipmentService, DeletionService) {
        let shipments = ShipmentStore::new(pool.clone());
        (
            ShipmentService::new(shipments.clone()),
            DeletionService::new(
                ClientStore::new(pool.clone()),
                CarrierStore::new(pool.clone()),
                ProductStore::new(pool.clone()),
                shipments,
            ),
        )
    }

    #[tokio::test]
    async fn test_referenced_client_cannot_be_deleted() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, deletion) = services(&pool);
        let now = Utc::now();

        let id = shipments
            .create(
                shipment_input(&fixture, "Blocking", Some(now + Duration::days(3)), None),
                now,
            )
            .await
            .unwrap();

        let result = deletion.delete(Referenced::Client, &fixture.client_id, now).await;
        match result {
            Err(AppError::StillReferenced { entity, blocking }) => {
                assert_eq!(entity, "client");
                assert_eq!(blocking.len(), 1);
                assert_eq!(blocking[0].id, id);
                assert_eq!(blocking[0].name.as_deref(), Some("Blocking"));
                assert_eq!(blocking[0].status, Status::NotDeparted);
            }
            other => panic!("expected StillReferenced, got {:?}", other),
        }

        // Nothing was removed
        assert!(ClientStore::new(pool.clone())
            .get_by_id(&fixture.client_id)
            .await
            .is_ok());

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, deletion) = services(&pool);
        let now = Utc::now();

        shipments
            .create(shipment_input(&fixture, "Pallets", None, None), now)
            .await
            .unwrap();

        let result = deletion
            .delete(Referenced::Product, &fixture.product_id, now)
            .await;
        assert!(matches!(
            result,
            Err(AppError::StillReferenced { entity: "product", ref blocking }) if blocking.len() == 1
        ));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_unreferenced_carrier_is_deleted() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (_, deletion) = services(&pool);

        deletion
            .delete(Referenced::Carrier, &fixture.carrier_id, Utc::now())
            .await
            .expect("Failed to delete carrier");
        assert!(CarrierStore::new(pool.clone())
            .fetch_all()
            .await
            .unwrap()
            .is_empty());

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_cancelling_blocking_shipment_unblocks_deletion() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, deletion) = services(&pool);
        let now = Utc::now();

        let id = shipments
            .create(shipment_input(&fixture, "Temporary", None, None), now)
            .await
            .unwrap();
        assert!(deletion
            .delete(Referenced::Client, &fixture.client_id, now)
            .await
            .is_err());

        shipments.delete(&id, now).await.expect("Failed to cancel shipment");
        deletion
            .delete(Referenced::Client, &fixture.client_id, now)
            .await
            .expect("Client should be deletable once unreferenced");

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_in_transit_shipment_is_locked() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, _) = services(&pool);
        let now = Utc::now();

        let id = shipments
            .create(
                shipment_input(&fixture, "On the road", Some(now - Duration::days(1)), None),
                now,
            )
            .await
            .unwrap();
        let before = shipments.get(&id, now).await.unwrap();
        assert_eq!(before.status, Status::InTransit);
        assert!(!before.editable);

        let patch = ShipmentPatch {
            name: Some(Some("Renamed".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            shipments.update(&id, patch, now).await,
            Err(AppError::ShipmentLocked)
        ));
        assert!(matches!(
            shipments.delete(&id, now).await,
            Err(AppError::ShipmentLocked)
        ));
        assert!(matches!(
            shipments.replace_line_items(&id, Vec::new(), now).await,
            Err(AppError::ShipmentLocked)
        ));

        let after = shipments.get(&id, now).await.unwrap();
        assert_eq!(after, before);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_update_before_departure() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, _) = services(&pool);
        let now = Utc::now();
        let departure = now + Duration::days(2);

        let id = shipments
            .create(shipment_input(&fixture, "Planned", Some(departure), None), now)
            .await
            .unwrap();

        let patch = ShipmentPatch {
            name: Some(Some("Planned, bigger".to_string())),
            arrival_date: Some(Some(departure + Duration::days(1))),
            ..Default::default()
        };
        let updated = shipments.update(&id, patch, now).await.unwrap();
        assert_eq!(updated.shipment.name.as_deref(), Some("Planned, bigger"));
        assert!(updated.shipment.arrival_date.is_some());
        assert!(updated.planned_departure);
        assert_eq!(updated.status, Status::NotDeparted);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_unknown_client_is_a_validation_error() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, _) = services(&pool);

        let mut input = shipment_input(&fixture, "Orphan", None, None);
        input.client_id = "client-missing".to_string();

        assert!(matches!(
            shipments.create(input, Utc::now()).await,
            Err(AppError::Validation(_))
        ));
        assert!(ShipmentStore::new(pool.clone())
            .fetch_all()
            .await
            .unwrap()
            .is_empty());

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_dashboard_filters_by_status() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let (shipments, _) = services(&pool);
        let now = Utc::now();

        shipments
            .create(shipment_input(&fixture, "Waiting", None, None), now)
            .await
            .unwrap();
        shipments
            .create(
                shipment_input(
                    &fixture,
                    "Done",
                    Some(now - Duration::days(3)),
                    Some(now - Duration::days(1)),
                ),
                now,
            )
            .await
            .unwrap();

        let dashboard = DashboardService::new(
            ShipmentStore::new(pool.clone()),
            ClientStore::new(pool.clone()),
            CarrierStore::new(pool.clone()),
        );
        let params: ProjectionParams = serde_json::from_value(serde_json::json!({
            "status": "delivered"
        }))
        .unwrap();

        let view = dashboard.load(&params, now).await.unwrap();
        assert_eq!(view.total, 2);
        assert_eq!(view.shipments.len(), 1);
        assert_eq!(view.shipments[0].shipment.name.as_deref(), Some("Done"));
        assert_eq!(view.clients.len(), 1);
        assert_eq!(view.carriers.len(), 1);

        teardown_test_db(db_path, pool).await;
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use axum::{
        body::{self, Body},
        extract::ws::Message,
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (db_path, pool) = setup_test_db().await;
        let app = handlers::router(AppState::new(pool.clone()));

        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_create_and_list_shipments() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let app = handlers::router(AppState::new(pool.clone()));

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/shipments",
            Some(json!({
                "clientId": fixture.client_id,
                "carrierId": fixture.carrier_id,
                "name": "Via HTTP",
                "lineItems": [{ "productId": fixture.product_id, "quantity": 4 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, list) = send(
            &app,
            Method::GET,
            "/api/shipments?status=not_departed&search=http",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id.as_str());
        assert_eq!(list[0]["status"], "not_departed");
        assert_eq!(list[0]["editable"], true);
        assert_eq!(list[0]["client"]["name"], "Acme Corp");

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_arrival_before_departure_is_rejected() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let app = handlers::router(AppState::new(pool.clone()));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/shipments",
            Some(json!({
                "clientId": fixture.client_id,
                "carrierId": fixture.carrier_id,
                "departureDate": "2024-05-10T08:00:00Z",
                "arrivalDate": "2024-05-09T08:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_delete_referenced_client_returns_conflict() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let id = ShipmentStore::new(pool.clone())
            .create(&shipment_input(&fixture, "Blocking", None, None), Utc::now())
            .await
            .unwrap();
        let app = handlers::router(AppState::new(pool.clone()));

        let uri = format!("/api/clients/{}", fixture.client_id);
        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("linked to one or more shipments"));
        assert_eq!(body["blockingShipments"][0]["id"], id.as_str());
        assert_eq!(body["blockingShipments"][0]["status"], "not_departed");

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_patch_delivered_shipment_returns_conflict() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let now = Utc::now();
        let id = ShipmentStore::new(pool.clone())
            .create(
                &shipment_input(
                    &fixture,
                    "Delivered",
                    Some(now - Duration::days(4)),
                    Some(now - Duration::days(2)),
                ),
                now,
            )
            .await
            .unwrap();
        let app = handlers::router(AppState::new(pool.clone()));

        let uri = format!("/api/shipments/{}", id);
        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "Late edit" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], crate::error::SHIPMENT_LOCKED_MESSAGE);

        let (status, shipment) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shipment["name"], "Delivered");
        assert_eq!(shipment["status"], "delivered");

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_malformed_requests_use_error_envelope() {
        let (db_path, pool) = setup_test_db().await;
        let fixture = create_parties(&pool).await;
        let state = AppState::new(pool.clone());
        let (tx, mut rx) = mpsc::channel(8);
        state.connection_manager.register(Uuid::new_v4(), tx).await;
        let app = handlers::router(state);

        let (status, body) = send(&app, Method::GET, "/api/shipments?status=bogus", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/shipments",
            Some(json!({
                "clientId": fixture.client_id,
                "carrierId": fixture.carrier_id,
                "lineItems": [{ "productId": fixture.product_id, "quantity": -1 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        // The rejected mutation is reported like any other failure
        let notification = match rx.try_recv() {
            Ok(Message::Text(text)) => serde_json::from_str::<Value>(text.as_str()).unwrap(),
            other => panic!("expected an error notification, got {:?}", other),
        };
        assert_eq!(notification["data"]["kind"], "error");

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_stalled_dashboard_does_not_hold_up_mutations() {
        let (db_path, pool) = setup_test_db().await;
        let state = AppState::new(pool.clone());
        let (stalled, _never_drained) = mpsc::channel(1);
        state.connection_manager.register(Uuid::new_v4(), stalled).await;

        let within = std::time::Duration::from_secs(2);
        for message in ["Client created", "Client updated"] {
            tokio::time::timeout(within, state.report(Ok(()), message))
                .await
                .expect("mutation response waited on a stalled dashboard")
                .unwrap();
        }

        let (fresh, _rx) = mpsc::channel(1);
        tokio::time::timeout(
            within,
            state.connection_manager.register(Uuid::new_v4(), fresh),
        )
        .await
        .expect("new dashboard could not connect");

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_unknown_shipment_is_not_found() {
        let (db_path, pool) = setup_test_db().await;
        let app = handlers::router(AppState::new(pool.clone()));

        let (status, _) = send(&app, Method::GET, "/api/shipments/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        teardown_test_db(db_path, pool).await;
    }
}
