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
    models::product::ProductInput,
    services::deletion_service::Referenced,
};

pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = state.products.fetch_all().await?;
    Ok((StatusCode::OK, Json(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state.products.get_by_id(&id).await?;
    Ok((StatusCode::OK, Json(product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    AppJson(input): AppJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let result = state.products.create(input).await;
    let product = state.report(result, "Product created").await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let result = state.products.update(&id, input).await;
    let product = state.report(result, "Product updated").await?;
    Ok((StatusCode::OK, Json(product)))
}

/// Products referenced by a line item cannot be deleted
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state
        .deletion
        .delete(Referenced::Product, &id, Utc::now())
        .await;
    state.report(result, "Product deleted").await?;
    Ok(StatusCode::NO_CONTENT)
}
