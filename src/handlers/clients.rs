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
    models::client::ClientInput,
    services::deletion_service::Referenced,
};

pub async fn list_clients(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let clients = state.clients.fetch_all().await?;
    Ok((StatusCode::OK, Json(clients)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let client = state.clients.get_by_id(&id).await?;
    Ok((StatusCode::OK, Json(client)))
}

pub async fn create_client(
    State(state): State<AppState>,
    AppJson(input): AppJson<ClientInput>,
) -> Result<impl IntoResponse> {
    let result = state.clients.create(input).await;
    let client = state.report(result, "Client created").await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<ClientInput>,
) -> Result<impl IntoResponse> {
    let result = state.clients.update(&id, input).await;
    let client = state.report(result, "Client updated").await?;
    Ok((StatusCode::OK, Json(client)))
}

/// Delete a client; answers 409 with the blocking shipments when some still use it
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state
        .deletion
        .delete(Referenced::Client, &id, Utc::now())
        .await;
    state.report(result, "Client deleted").await?;
    Ok(StatusCode::NO_CONTENT)
}
