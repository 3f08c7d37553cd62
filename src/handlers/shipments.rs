use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::Result,
    handlers::{
        extract::{AppJson, AppQuery},
        AppState,
    },
    models::shipment::{LineItemInput, ShipmentInput, ShipmentPatch},
    tracking::ProjectionParams,
};

/// Shipments, clients and carriers as the dashboard shows them
pub async fn dashboard(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProjectionParams>,
) -> Result<impl IntoResponse> {
    let view = state.dashboard.load(&params, Utc::now()).await?;
    Ok((StatusCode::OK, Json(view)))
}

pub async fn list_shipments(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProjectionParams>,
) -> Result<impl IntoResponse> {
    let shipments = state.dashboard.list(&params, Utc::now()).await?;
    Ok((StatusCode::OK, Json(shipments)))
}

pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let shipment = state.shipments.get(&id, Utc::now()).await?;
    Ok((StatusCode::OK, Json(shipment)))
}

pub async fn create_shipment(
    State(state): State<AppState>,
    AppJson(input): AppJson<ShipmentInput>,
) -> Result<impl IntoResponse> {
    let result = state.shipments.create(input, Utc::now()).await;
    let id = state.report(result, "Shipment created").await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Partial update; rejected once the shipment has departed
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<ShipmentPatch>,
) -> Result<impl IntoResponse> {
    let result = state.shipments.update(&id, patch, Utc::now()).await;
    let shipment = state.report(result, "Shipment updated").await?;
    Ok((StatusCode::OK, Json(shipment)))
}

pub async fn replace_line_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(items): AppJson<Vec<LineItemInput>>,
) -> Result<impl IntoResponse> {
    let result = state.shipments.replace_line_items(&id, items, Utc::now()).await;
    let shipment = state.report(result, "Shipment updated").await?;
    Ok((StatusCode::OK, Json(shipment)))
}

pub async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state.shipments.delete(&id, Utc::now()).await;
    state.report(result, "Shipment cancelled").await?;
    Ok(StatusCode::NO_CONTENT)
}
