use axum::{extract::State, response::Json, Extension};
use serde::Serialize;

use crate::access::{load_access, Module, Page};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MyAccessResponse {
    pub is_admin: bool,
    pub modules: Vec<Module>,
    pub pages: Vec<Page>,
}

/// `GET /api/access/me`: modules and pages the caller may open.
pub async fn my_access_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<MyAccessResponse>> {
    let table = load_access(&state.db, user_id).await?;

    Ok(Json(MyAccessResponse {
        is_admin: table.is_admin,
        modules: table.visible_modules(),
        pages: table.visible_pages(),
    }))
}
