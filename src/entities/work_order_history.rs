use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{user::UserRole, work_order::WorkOrderStatus, UuidList};

/// Immutable audit record for one transition. Created exactly once at
/// commit time, never updated. `position` orders the records per work
/// order and strictly increases.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub position: i32,
    pub action: String,
    /// Absent for the CREATE record.
    pub from_status: Option<WorkOrderStatus>,
    pub to_status: WorkOrderStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub performed_by: Uuid,
    /// Snapshot of the assigned staff at the time of the action.
    #[sea_orm(column_type = "Json")]
    pub affected_staff_ids: UuidList,
    pub actor_role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
