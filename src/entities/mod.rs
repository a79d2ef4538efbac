//! Database entities for the work order service.
//!
//! `work_order` and its history/assignee rows are owned by the lifecycle
//! engine. `department` and `user` are read-mostly directory data; the core
//! only holds references to them. `delivery_log` is the notification audit
//! trail.

pub mod delivery_log;
pub mod department;
pub mod user;
pub mod work_order;
pub mod work_order_assignee;
pub mod work_order_counter;
pub mod work_order_history;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use department::Organization;
pub use user::UserRole;
pub use work_order::WorkOrderStatus;

/// Ordered list of opaque storage references, stored as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

/// List of entity references stored as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct UuidList(pub Vec<Uuid>);

/// Organization memberships stored as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OrganizationList(pub Vec<Organization>);
