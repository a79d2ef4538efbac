//! HTTP surface for work orders.
//!
//! Handlers stay thin: extract the principal and payload, delegate to the
//! lifecycle engine, and map the result to a status code. All business
//! decisions live in the service layer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::{ErrorResponse, ServiceError},
    services::work_orders::{
        ActionRequest, CreateWorkOrderRequest, WorkOrderResponse, WorkOrderSummary,
        WorkOrderWithContext,
    },
    AppState,
};

pub fn work_orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_work_order).get(list_work_orders))
        .route("/:id", get(get_work_order).delete(delete_work_order))
        .route("/:id/actions", post(apply_work_order_action))
}

/// Create a new work order
#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    request_body = CreateWorkOrderRequest,
    responses(
        (status = 201, description = "Work order created", body = WorkOrderResponse),
        (status = 400, description = "Invalid payload or department mismatch", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.work_orders.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List work orders visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    responses(
        (status = 200, description = "Visible work orders, newest first", body = [WorkOrderSummary]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Supervisor has no department here", body = ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let summaries = state.work_orders.list(&user).await?;
    Ok(Json(summaries))
}

/// Get one work order with its history
#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    params(("id" = Uuid, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order detail", body = WorkOrderWithContext),
        (status = 403, description = "No visibility into this work order", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.work_orders.get_with_context(&user, id).await?;
    Ok(Json(detail))
}

/// Apply a lifecycle action to a work order
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/actions",
    params(("id" = Uuid, Path, description = "Work order id")),
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Transition applied", body = WorkOrderResponse),
        (status = 400, description = "Invalid action or payload", body = ErrorResponse),
        (status = 403, description = "Actor not authorized for this action", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification, re-read and retry", body = ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn apply_work_order_action(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ActionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.work_orders.apply_action(&user, id, request).await?;
    Ok(Json(updated))
}

/// Soft-delete a work order (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/{id}",
    params(("id" = Uuid, Path, description = "Work order id")),
    responses(
        (status = 204, description = "Work order hidden"),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Work order not found", body = ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn delete_work_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.work_orders.soft_delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
