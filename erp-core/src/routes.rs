use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::access::my_access_handler;
use crate::auth::jwt_middleware;
use crate::billings::handlers::{
    create_billing_handler, delete_billing_handler, get_billing_handler, list_billings_handler,
    set_classification_handler, update_billing_handler,
};
use crate::collections::handlers::{
    create_collection_handler, delete_collection_handler, list_collections_handler,
};
use crate::orders::handlers::{
    add_attachment_handler, create_order_handler, delete_order_handler, get_order_handler,
    list_orders_handler, order_tree_handler, remove_attachment_handler, update_order_handler,
};
use crate::receivables::list_receivables_handler;
use crate::AppState;

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "erp-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Database health check endpoint.
///
/// Verifies that the database connection is working by executing
/// a simple query.
async fn db_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected"
    })))
}

/// Creates the main application router.
///
/// Everything under `/api` requires a bearer token; the health routes are
/// public.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/access/me", get(my_access_handler))
        .route("/orders", get(list_orders_handler).post(create_order_handler))
        .route("/orders/tree", get(order_tree_handler))
        .route(
            "/orders/:id",
            get(get_order_handler)
                .patch(update_order_handler)
                .delete(delete_order_handler),
        )
        .route(
            "/orders/:id/attachments",
            post(add_attachment_handler).delete(remove_attachment_handler),
        )
        .route(
            "/billings",
            get(list_billings_handler).post(create_billing_handler),
        )
        .route(
            "/billings/:id",
            get(get_billing_handler)
                .patch(update_billing_handler)
                .delete(delete_billing_handler),
        )
        .route(
            "/billings/:id/classification",
            put(set_classification_handler),
        )
        .route(
            "/collections",
            get(list_collections_handler).post(create_collection_handler),
        )
        .route(
            "/collections/:id",
            axum::routing::delete(delete_collection_handler),
        )
        .route("/receivables", get(list_receivables_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/erp_test".to_string()),
            "JWT_SECRET" => Some("test-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::new(pool, config)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders/tree")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_rejects_bad_token() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/receivables")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
