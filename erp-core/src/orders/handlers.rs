use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::access::{ensure_page, Page};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::order::{Attachment, CreateAttachment, CreateOrder, Order, UpdateOrder};
use crate::orders::hierarchy::OrderRow;
use crate::orders::service;
use crate::AppState;

/// `GET /api/orders`: flat order list.
pub async fn list_orders_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Order>>> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    Ok(Json(service::list_orders(&state.db).await?))
}

/// `GET /api/orders/tree`: new contracts with their change contracts nested.
pub async fn order_tree_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<OrderRow>>> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    let rows = service::list_order_rows(&state.db).await?;
    info!(
        "Serving {} order rows ({} with change contracts) to user {}",
        rows.len(),
        rows.iter().filter(|r| r.has_children()).count(),
        user_id
    );
    Ok(Json(rows))
}

pub async fn get_order_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    Ok(Json(service::get_order(&state.db, order_id).await?))
}

pub async fn create_order_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(input): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<Order>)> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    let order = service::create_order(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrder>,
) -> AppResult<Json<Order>> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    Ok(Json(service::update_order(&state.db, order_id, input).await?))
}

pub async fn delete_order_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    service::delete_order(&state.db, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_attachment_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<CreateAttachment>,
) -> AppResult<(StatusCode, Json<Order>)> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    let order = service::add_attachment(&state.db, order_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct AttachmentPath {
    pub path: String,
}

pub async fn remove_attachment_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Query(query): Query<AttachmentPath>,
) -> AppResult<Json<Vec<Attachment>>> {
    ensure_page(&state.db, user_id, Page::Orders).await?;
    Ok(Json(
        service::remove_attachment(&state.db, order_id, &query.path).await?,
    ))
}
