use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

use super::{department::Organization, StringList};

/// Lifecycle states of a work order.
///
/// The valid moves between states live in the transition table
/// (`services::transitions`), not here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Display, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    #[sea_orm(string_value = "WAITING_SUPERVISOR_APPROVAL")]
    WaitingSupervisorApproval,
    #[sea_orm(string_value = "REJECTED_BY_SUPERVISOR")]
    RejectedBySupervisor,
    #[sea_orm(string_value = "WAITING_TARGET_REVIEW")]
    WaitingTargetReview,
    #[sea_orm(string_value = "REJECTED_BY_TARGET_SUPERVISOR")]
    RejectedByTargetSupervisor,
    #[sea_orm(string_value = "ASSIGNED_TO_STAFF")]
    AssignedToStaff,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "WAITING_REQUESTER_CONFIRMATION")]
    WaitingRequesterConfirmation,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

impl WorkOrderStatus {
    /// Terminal states accept no further actions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RejectedBySupervisor | Self::RejectedByTargetSupervisor | Self::Closed
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization: Organization,
    pub requester_department_id: Uuid,
    pub target_department_id: Uuid,
    pub requester_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub incident_date: DateTime<Utc>,
    /// Storage references uploaded by the requester.
    #[sea_orm(column_type = "Json")]
    pub attachments: StringList,
    /// Storage references appended by staff during fulfillment. Retained
    /// across confirmation-rejection loops.
    #[sea_orm(column_type = "Json")]
    pub result_attachments: StringList,
    pub status: WorkOrderStatus,
    /// Human-readable display number, immutable once assigned.
    #[sea_orm(unique)]
    pub wo_number: String,
    pub is_deleted: bool,
    /// Optimistic lock; every committed transition bumps it.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
