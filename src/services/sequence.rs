//! Sequence Allocator: gapless, per-(organization, department) counters
//! backing work order display numbers.
//!
//! `next` runs against the caller's transaction, so a creation that fails
//! after allocation rolls the increment back instead of leaving a gap.

use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    entities::{work_order_counter, Organization},
    errors::ServiceError,
};

pub struct SequenceAllocator;

impl SequenceAllocator {
    /// Atomically increments and returns the counter for the scope,
    /// creating it lazily on first use.
    ///
    /// First use seeds the row at 0 with `ON CONFLICT DO NOTHING`, so a
    /// lost seed race never raises a unique violation that would abort
    /// the caller's transaction. The increment itself is a conditional
    /// `UPDATE seq = seq + 1`; the read-back inside the same transaction
    /// observes our own write.
    pub async fn next<C: ConnectionTrait>(
        conn: &C,
        organization: Organization,
        department_id: Uuid,
    ) -> Result<i64, ServiceError> {
        work_order_counter::Entity::insert(work_order_counter::ActiveModel {
            organization: Set(organization),
            department_id: Set(department_id),
            seq: Set(0),
            updated_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([
                work_order_counter::Column::Organization,
                work_order_counter::Column::DepartmentId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        let updated = work_order_counter::Entity::update_many()
            .col_expr(
                work_order_counter::Column::Seq,
                Expr::col(work_order_counter::Column::Seq).add(1),
            )
            .col_expr(
                work_order_counter::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(work_order_counter::Column::Organization.eq(organization))
            .filter(work_order_counter::Column::DepartmentId.eq(department_id))
            .exec(conn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::InternalError(format!(
                "sequence counter for {}/{} missing after seed",
                organization, department_id
            )));
        }

        let row = work_order_counter::Entity::find_by_id((organization, department_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError("sequence counter vanished after increment".to_string())
            })?;
        Ok(row.seq)
    }
}

/// Formats the display number: `WO/{org}/{dept code}/{seq}`, seq
/// zero-padded to 3 digits and widening past 999.
pub fn format_wo_number(organization: Organization, department_code: &str, seq: i64) -> String {
    format!("WO/{}/{}/{:03}", organization, department_code, seq)
}
