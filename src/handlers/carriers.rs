use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    error::Result,
    handlers::{extract::AppJson, AppState},
    models::carrier::CarrierInput,
    services::deletion_service::Referenced,
};

pub async fn list_carriers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let carriers = state.carriers.fetch_all().await?;
    Ok((StatusCode::OK, Json(carriers)))
}

pub async fn get_carrier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let carrier = state.carriers.get_by_id(&id).await?;
    Ok((StatusCode::OK, Json(carrier)))
}

pub async fn create_carrier(
    State(state): State<AppState>,
    AppJson(input): AppJson<CarrierInput>,
) -> Result<impl IntoResponse> {
    let result = state.carriers.create(input).await;
    let carrier = state.report(result, "Carrier created").await?;
    Ok((StatusCode::CREATED, Json(carrier)))
}

pub async fn update_carrier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<CarrierInput>,
) -> Result<impl IntoResponse> {
    let result = state.carriers.update(&id, input).await;
    let carrier = state.report(result, "Carrier updated").await?;
    Ok((StatusCode::OK, Json(carrier)))
}

pub async fn delete_carrier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state
        .deletion
        .delete(Referenced::Carrier, &id, Utc::now())
        .await;
    state.report(result, "Carrier deleted").await?;
    Ok(StatusCode::NO_CONTENT)
}
