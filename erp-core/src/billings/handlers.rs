use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{ensure_page, Page};
use crate::auth::CurrentUser;
use crate::billings::service;
use crate::error::AppResult;
use crate::models::billing::{Billing, CreateBilling, SetClassification, UpdateBilling};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BillingQuery {
    pub order_id: Option<Uuid>,
}

pub async fn list_billings_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<BillingQuery>,
) -> AppResult<Json<Vec<Billing>>> {
    ensure_page(&state.db, user_id, Page::Billings).await?;
    Ok(Json(service::list_billings(&state.db, query.order_id).await?))
}

pub async fn get_billing_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(billing_id): Path<Uuid>,
) -> AppResult<Json<Billing>> {
    ensure_page(&state.db, user_id, Page::Billings).await?;
    Ok(Json(service::get_billing(&state.db, billing_id).await?))
}

pub async fn create_billing_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(input): Json<CreateBilling>,
) -> AppResult<(StatusCode, Json<Billing>)> {
    ensure_page(&state.db, user_id, Page::Billings).await?;
    let billing = service::create_billing(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(billing)))
}

pub async fn update_billing_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(billing_id): Path<Uuid>,
    Json(input): Json<UpdateBilling>,
) -> AppResult<Json<Billing>> {
    ensure_page(&state.db, user_id, Page::Billings).await?;
    Ok(Json(service::update_billing(&state.db, billing_id, input).await?))
}

/// `PUT /api/billings/:id/classification`, edited from the receivable screen.
pub async fn set_classification_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(billing_id): Path<Uuid>,
    Json(input): Json<SetClassification>,
) -> AppResult<Json<Billing>> {
    ensure_page(&state.db, user_id, Page::Receivables).await?;
    Ok(Json(
        service::set_classification(&state.db, billing_id, input.classification).await?,
    ))
}

pub async fn delete_billing_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(billing_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_page(&state.db, user_id, Page::Billings).await?;
    service::delete_billing(&state.db, billing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
