use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::department::Organization;

/// Per-(organization, requester department) sequence counter backing the
/// display number. Rows are created lazily on first use and only ever
/// incremented, under the allocator's compare-and-increment discipline.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub organization: Organization,
    #[sea_orm(primary_key, auto_increment = false)]
    pub department_id: Uuid,
    pub seq: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
