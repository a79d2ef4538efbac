//! Work order lifecycle service.
//!
//! A department-scoped approval and fulfillment pipeline: requesters open
//! work orders against a target department, supervisors approve or reject,
//! staff fulfill, and the requester confirms completion. Every transition
//! is audited and announced to the people it concerns.

pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppConfig, db::DbPool, directory::DirectoryService, events::EventSender,
    services::work_orders::WorkOrderService,
};

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub work_orders: Arc<WorkOrderService>,
    pub directory: Arc<dyn DirectoryService>,
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let db_ok = db::check_connection(&state.db).await.is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": if db_ok { "up" } else { "down" },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Assembles the application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest("/api/v1/work-orders", handlers::work_orders::work_orders_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
