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
use crate::collections::service;
use crate::error::AppResult;
use crate::models::collection::{Collection, CreateCollection};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub billing_id: Option<Uuid>,
}

pub async fn list_collections_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<CollectionQuery>,
) -> AppResult<Json<Vec<Collection>>> {
    ensure_page(&state.db, user_id, Page::Collections).await?;
    Ok(Json(
        service::list_collections(&state.db, query.billing_id).await?,
    ))
}

pub async fn create_collection_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(input): Json<CreateCollection>,
) -> AppResult<(StatusCode, Json<Collection>)> {
    ensure_page(&state.db, user_id, Page::Collections).await?;
    let collection = service::create_collection(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn delete_collection_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(collection_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_page(&state.db, user_id, Page::Collections).await?;
    service::delete_collection(&state.db, collection_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
