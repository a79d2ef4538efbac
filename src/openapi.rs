//! OpenAPI document served at `/swagger-ui`.

use utoipa::OpenApi;

use crate::{
    entities::{Organization, UserRole, WorkOrderStatus},
    errors::ErrorResponse,
    handlers,
    services::{
        transitions::WorkOrderAction,
        work_orders::{
            ActionRequest, AssigneeRef, CreateWorkOrderRequest, SupervisorContext,
            TransitionRecordResponse, WorkOrderResponse, WorkOrderSummary, WorkOrderWithContext,
        },
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::work_orders::create_work_order,
        handlers::work_orders::list_work_orders,
        handlers::work_orders::get_work_order,
        handlers::work_orders::apply_work_order_action,
        handlers::work_orders::delete_work_order,
    ),
    components(schemas(
        CreateWorkOrderRequest,
        ActionRequest,
        WorkOrderResponse,
        WorkOrderSummary,
        WorkOrderWithContext,
        TransitionRecordResponse,
        AssigneeRef,
        SupervisorContext,
        WorkOrderAction,
        WorkOrderStatus,
        Organization,
        UserRole,
        ErrorResponse,
    )),
    tags(
        (name = "work-orders", description = "Work order lifecycle endpoints")
    ),
    info(
        title = "Work Order API",
        description = "Department-scoped work order lifecycle service"
    )
)]
pub struct ApiDoc;
