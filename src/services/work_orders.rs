//! Lifecycle Engine: creation, transitions, visibility, and soft deletion
//! of work orders.
//!
//! All writes to a work order happen here, under an optimistic version
//! check, with the matching history record inserted in the same
//! transaction. Notification fan-out runs after commit on a detached task.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    db::DbPool,
    directory::{Department, DepartmentFilter, DirectoryService},
    entities::{
        work_order, work_order_assignee, work_order_history, Organization, StringList, UserRole,
        UuidList, WorkOrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        notifications::{
            compute_recipients, NotificationCoordinator, RecipientContext, TransitionNotice,
            WorkOrderSnapshot,
        },
        sequence::{format_wo_number, SequenceAllocator},
        transitions::{
            is_authorized, resolve, ActionContext, Capabilities, WorkOrderAction,
        },
    },
};

/// Behavior switches for the lifecycle engine.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    /// Work orders created by supervisors skip the first approval stage.
    pub supervisor_create_bypass: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            supervisor_create_bypass: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkOrderRequest {
    /// Department expected to fulfill the work order.
    pub target_department_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    pub incident_date: DateTime<Utc>,
    /// Storage references to supporting files.
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ActionRequest {
    pub action: WorkOrderAction,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
    /// Required (non-empty) when the target supervisor approves.
    #[serde(default)]
    pub assigned_staff_ids: Vec<Uuid>,
    /// Evidence attached by staff when requesting confirmation.
    #[serde(default)]
    pub result_attachments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkOrderResponse {
    pub id: Uuid,
    pub wo_number: String,
    pub organization: Organization,
    pub requester_id: Uuid,
    pub requester_department_id: Uuid,
    pub target_department_id: Uuid,
    pub title: String,
    pub description: String,
    pub incident_date: DateTime<Utc>,
    pub attachments: Vec<String>,
    pub result_attachments: Vec<String>,
    pub status: WorkOrderStatus,
    pub assigned_staff_ids: Vec<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One audit record, with the performer's name resolved when available.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionRecordResponse {
    pub position: i32,
    pub action: String,
    pub from_status: Option<WorkOrderStatus>,
    pub to_status: WorkOrderStatus,
    pub note: Option<String>,
    pub performed_by: Uuid,
    pub performed_by_name: Option<String>,
    pub actor_role: UserRole,
    pub affected_staff_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Which side of the work order a supervisor viewer is responsible for.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorContext {
    Requester,
    Target,
}

/// Assigned staff member with their directory name, when resolvable.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssigneeRef {
    pub id: Uuid,
    pub name: Option<String>,
}

/// Detail view: the work order plus its full history and viewer context.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkOrderWithContext {
    #[serde(flatten)]
    pub work_order: WorkOrderResponse,
    pub requester_name: Option<String>,
    pub requester_department_name: Option<String>,
    pub target_department_name: Option<String>,
    pub assignees: Vec<AssigneeRef>,
    pub history: Vec<TransitionRecordResponse>,
    /// Present only when the viewer supervises one of the two departments.
    pub supervisor_context: Option<SupervisorContext>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkOrderSummary {
    pub id: Uuid,
    pub wo_number: String,
    pub organization: Organization,
    pub title: String,
    pub status: WorkOrderStatus,
    pub requester_id: Uuid,
    pub requester_department_id: Uuid,
    pub target_department_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrderSummary {
    fn from_model(m: work_order::Model) -> Self {
        Self {
            id: m.id,
            wo_number: m.wo_number,
            organization: m.organization,
            title: m.title,
            status: m.status,
            requester_id: m.requester_id,
            requester_department_id: m.requester_department_id,
            target_department_id: m.target_department_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn model_to_response(m: work_order::Model, assigned_staff_ids: Vec<Uuid>) -> WorkOrderResponse {
    WorkOrderResponse {
        id: m.id,
        wo_number: m.wo_number,
        organization: m.organization,
        requester_id: m.requester_id,
        requester_department_id: m.requester_department_id,
        target_department_id: m.target_department_id,
        title: m.title,
        description: m.description,
        incident_date: m.incident_date,
        attachments: m.attachments.0,
        result_attachments: m.result_attachments.0,
        status: m.status,
        assigned_staff_ids,
        version: m.version,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[derive(Clone)]
pub struct WorkOrderService {
    db: Arc<DbPool>,
    directory: Arc<dyn DirectoryService>,
    notifier: Arc<NotificationCoordinator>,
    event_sender: Option<Arc<EventSender>>,
    policy: LifecyclePolicy,
}

impl WorkOrderService {
    pub fn new(
        db: Arc<DbPool>,
        directory: Arc<dyn DirectoryService>,
        notifier: Arc<NotificationCoordinator>,
        event_sender: Option<Arc<EventSender>>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            db,
            directory,
            notifier,
            event_sender,
            policy,
        }
    }

    /// Creates a work order: allocates its display number, writes the
    /// CREATE history record, and notifies the first decision maker.
    #[instrument(skip(self, request), fields(actor = %actor.id))]
    pub async fn create(
        &self,
        actor: &AuthUser,
        request: CreateWorkOrderRequest,
    ) -> Result<WorkOrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let organization = actor.active_organization;

        let target_department = self
            .directory
            .get_department(request.target_department_id)
            .await?
            .ok_or_else(|| {
                ServiceError::DepartmentMismatch("target department does not exist".to_string())
            })?;
        if target_department.organization != organization {
            return Err(ServiceError::DepartmentMismatch(format!(
                "target department belongs to {}, not {}",
                target_department.organization, organization
            )));
        }

        let requester = self
            .directory
            .get_user(actor.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("requester not found in directory".to_string()))?;

        let requester_department = self
            .department_in_organization(&requester.department_ids, organization)
            .await?
            .ok_or_else(|| {
                ServiceError::DepartmentMismatch(format!(
                    "requester has no department in organization {}",
                    organization
                ))
            })?;

        let bypass = self.policy.supervisor_create_bypass && actor.role == UserRole::Supervisor;
        let initial_status = if bypass {
            WorkOrderStatus::WaitingTargetReview
        } else {
            WorkOrderStatus::WaitingSupervisorApproval
        };

        let now = Utc::now();
        let id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        // Allocated inside the transaction so a failed insert leaves no gap.
        // The counter scope and code are the requester's own department.
        let seq = SequenceAllocator::next(&txn, organization, requester_department.id).await?;
        let wo_number = format_wo_number(organization, &requester_department.code, seq);

        let model = work_order::ActiveModel {
            id: Set(id),
            organization: Set(organization),
            requester_department_id: Set(requester_department.id),
            target_department_id: Set(request.target_department_id),
            requester_id: Set(actor.id),
            title: Set(request.title.clone()),
            description: Set(request.description.clone()),
            incident_date: Set(request.incident_date),
            attachments: Set(StringList(request.attachments.clone())),
            result_attachments: Set(StringList(Vec::new())),
            status: Set(initial_status),
            wo_number: Set(wo_number.clone()),
            is_deleted: Set(false),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&txn).await?;

        work_order_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_order_id: Set(id),
            position: Set(1),
            action: Set("CREATE".to_string()),
            from_status: Set(None),
            to_status: Set(initial_status),
            note: Set(Some(format!("Work order created by {}", actor.role))),
            performed_by: Set(actor.id),
            affected_staff_ids: Set(UuidList(Vec::new())),
            actor_role: Set(actor.role),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.emit(Event::WorkOrderCreated {
            work_order_id: id,
            wo_number: wo_number.clone(),
        })
        .await;

        self.notify_created(&saved, actor.id, bypass);

        Ok(model_to_response(saved, Vec::new()))
    }

    /// Applies a lifecycle action. The status write is guarded by the
    /// version the work order was read at; losing that race is `Conflict`
    /// and the caller re-reads and retries.
    #[instrument(skip(self, request), fields(actor = %actor.id, %work_order_id))]
    pub async fn apply_action(
        &self,
        actor: &AuthUser,
        work_order_id: Uuid,
        request: ActionRequest,
    ) -> Result<WorkOrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let wo = self.load_live(work_order_id).await?;

        if !actor.is_admin() && actor.active_organization != wo.organization {
            return Err(ServiceError::Forbidden(
                "work order belongs to a different organization".to_string(),
            ));
        }

        let rule = resolve(wo.status, request.action).ok_or_else(|| {
            ServiceError::InvalidAction(format!(
                "action {} is not valid while status is {}",
                request.action, wo.status
            ))
        })?;

        let capabilities = self.capabilities_of(actor, wo.organization).await?;
        let current_assignees = self.assignee_ids(work_order_id).await?;

        let ctx = ActionContext {
            actor: actor.id,
            capabilities: &capabilities,
            requester_id: wo.requester_id,
            requester_department_id: wo.requester_department_id,
            target_department_id: wo.target_department_id,
            assigned_staff: &current_assignees,
        };
        if !is_authorized(rule, &ctx) {
            return Err(ServiceError::Forbidden(format!(
                "not authorized to {} this work order",
                request.action
            )));
        }

        let assigning = rule.to == WorkOrderStatus::AssignedToStaff;
        if assigning {
            if request.assigned_staff_ids.is_empty() {
                return Err(ServiceError::InvalidPayload(
                    "assigned_staff_ids must not be empty when approving for assignment"
                        .to_string(),
                ));
            }
            let found = self
                .directory
                .find_users(&request.assigned_staff_ids)
                .await?;
            if found.len() != request.assigned_staff_ids.len() {
                return Err(ServiceError::InvalidPayload(
                    "assigned_staff_ids contains unknown users".to_string(),
                ));
            }
        }

        let merged_result_attachments = if request.action == WorkOrderAction::RequestConfirmation
            && !request.result_attachments.is_empty()
        {
            let mut merged = wo.result_attachments.0.clone();
            merged.extend(request.result_attachments.iter().cloned());
            Some(StringList(merged))
        } else {
            None
        };

        // Approvals always record the fixed wording; other actions keep
        // the caller's note when one is given.
        let note = if rule.note_overridable {
            request
                .note
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| rule.default_note.to_string())
        } else {
            rule.default_note.to_string()
        };

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut update = work_order::Entity::update_many()
            .col_expr(work_order::Column::Status, Expr::value(rule.to))
            .col_expr(work_order::Column::Version, Expr::value(wo.version + 1))
            .col_expr(work_order::Column::UpdatedAt, Expr::value(now))
            .filter(work_order::Column::Id.eq(work_order_id))
            .filter(work_order::Column::Version.eq(wo.version))
            .filter(work_order::Column::IsDeleted.eq(false));

        if let Some(list) = &merged_result_attachments {
            update = update.col_expr(
                work_order::Column::ResultAttachments,
                Expr::value(list.clone()),
            );
        }

        let updated = update.exec(&txn).await?;
        if updated.rows_affected == 0 {
            // Someone else transitioned this work order first.
            return Err(ServiceError::Conflict(format!(
                "work order {} changed concurrently, re-read and retry",
                wo.wo_number
            )));
        }

        if assigning {
            let rows: Vec<work_order_assignee::ActiveModel> = request
                .assigned_staff_ids
                .iter()
                .map(|user_id| work_order_assignee::ActiveModel {
                    work_order_id: Set(work_order_id),
                    user_id: Set(*user_id),
                    assigned_at: Set(now),
                })
                .collect();
            work_order_assignee::Entity::insert_many(rows)
                .exec(&txn)
                .await?;
        }

        let affected_staff = if assigning {
            request.assigned_staff_ids.clone()
        } else {
            current_assignees.clone()
        };

        let position = work_order_history::Entity::find()
            .filter(work_order_history::Column::WorkOrderId.eq(work_order_id))
            .count(&txn)
            .await? as i32
            + 1;

        work_order_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            work_order_id: Set(work_order_id),
            position: Set(position),
            action: Set(request.action.to_string()),
            from_status: Set(Some(wo.status)),
            to_status: Set(rule.to),
            note: Set(Some(note.clone())),
            performed_by: Set(actor.id),
            affected_staff_ids: Set(UuidList(affected_staff.clone())),
            actor_role: Set(actor.role),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.emit(Event::WorkOrderStatusChanged {
            work_order_id,
            old_status: wo.status,
            new_status: rule.to,
        })
        .await;

        // Assemble the response from the values the transaction wrote; a
        // re-read here could observe a later transition or a concurrent
        // soft delete.
        let mut committed = wo;
        committed.status = rule.to;
        committed.version += 1;
        committed.updated_at = now;
        if let Some(list) = merged_result_attachments {
            committed.result_attachments = list;
        }

        self.notify_transition(&committed, actor.id, request.action, rule.to, note, affected_staff.clone());

        Ok(model_to_response(committed, affected_staff))
    }

    /// Fetches one work order with its full history, applying the viewer's
    /// visibility rules.
    #[instrument(skip(self), fields(actor = %actor.id, %work_order_id))]
    pub async fn get_with_context(
        &self,
        actor: &AuthUser,
        work_order_id: Uuid,
    ) -> Result<WorkOrderWithContext, ServiceError> {
        let wo = self.load_live(work_order_id).await?;

        if !actor.is_admin() && actor.active_organization != wo.organization {
            return Err(ServiceError::Forbidden(
                "work order belongs to a different organization".to_string(),
            ));
        }

        let assignees = self.assignee_ids(work_order_id).await?;
        let capabilities = self.capabilities_of(actor, wo.organization).await?;

        let supervisor_context = if capabilities.supervises(wo.requester_department_id) {
            Some(SupervisorContext::Requester)
        } else if capabilities.supervises(wo.target_department_id) {
            Some(SupervisorContext::Target)
        } else {
            None
        };

        let visible = actor.is_admin()
            || wo.requester_id == actor.id
            || assignees.contains(&actor.id)
            || supervisor_context.is_some();
        if !visible {
            return Err(ServiceError::Forbidden(
                "no visibility into this work order".to_string(),
            ));
        }

        let history = work_order_history::Entity::find()
            .filter(work_order_history::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_history::Column::Position)
            .all(&*self.db)
            .await?;

        // One batched lookup for every name the view needs.
        let mut user_ids: Vec<Uuid> = history.iter().map(|h| h.performed_by).collect();
        user_ids.push(wo.requester_id);
        user_ids.extend(assignees.iter().copied());
        user_ids.sort_unstable();
        user_ids.dedup();
        let names: HashMap<Uuid, String> = self
            .directory
            .find_users(&user_ids)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "directory unavailable while resolving names");
                Vec::new()
            })
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        let requester_department_name = self
            .directory
            .get_department(wo.requester_department_id)
            .await
            .ok()
            .flatten()
            .map(|d| d.name);
        let target_department_name = self
            .directory
            .get_department(wo.target_department_id)
            .await
            .ok()
            .flatten()
            .map(|d| d.name);

        let history = history
            .into_iter()
            .map(|h| TransitionRecordResponse {
                position: h.position,
                action: h.action,
                from_status: h.from_status,
                to_status: h.to_status,
                note: h.note,
                performed_by: h.performed_by,
                performed_by_name: names.get(&h.performed_by).cloned(),
                actor_role: h.actor_role,
                affected_staff_ids: h.affected_staff_ids.0,
                created_at: h.created_at,
            })
            .collect();

        let requester_name = names.get(&wo.requester_id).cloned();
        let assignee_refs = assignees
            .iter()
            .map(|id| AssigneeRef {
                id: *id,
                name: names.get(id).cloned(),
            })
            .collect();

        Ok(WorkOrderWithContext {
            work_order: model_to_response(wo, assignees),
            requester_name,
            requester_department_name,
            target_department_name,
            assignees: assignee_refs,
            history,
            supervisor_context,
        })
    }

    /// Lists the work orders the caller is allowed to see in their active
    /// organization, newest first.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn list(&self, actor: &AuthUser) -> Result<Vec<WorkOrderSummary>, ServiceError> {
        let base = work_order::Entity::find()
            .filter(work_order::Column::IsDeleted.eq(false))
            .filter(work_order::Column::Organization.eq(actor.active_organization))
            .order_by_desc(work_order::Column::CreatedAt);

        let models = match actor.role {
            UserRole::Admin => base.all(&*self.db).await?,
            UserRole::Requester => {
                base.filter(work_order::Column::RequesterId.eq(actor.id))
                    .all(&*self.db)
                    .await?
            }
            UserRole::Supervisor => {
                let departments = self
                    .directory
                    .list_departments(DepartmentFilter {
                        supervisor: Some(actor.id),
                        organization: Some(actor.active_organization),
                    })
                    .await?;
                if departments.is_empty() {
                    return Err(ServiceError::NotConfigured(
                        "supervisor has no department in this organization".to_string(),
                    ));
                }
                let dept_ids: Vec<Uuid> = departments.iter().map(|d| d.id).collect();
                base.filter(
                    Condition::any()
                        .add(
                            work_order::Column::RequesterDepartmentId
                                .is_in(dept_ids.iter().copied()),
                        )
                        .add(
                            work_order::Column::TargetDepartmentId.is_in(dept_ids.iter().copied()),
                        ),
                )
                .all(&*self.db)
                .await?
            }
            UserRole::Staff => {
                let assigned_ids: Vec<Uuid> = work_order_assignee::Entity::find()
                    .filter(work_order_assignee::Column::UserId.eq(actor.id))
                    .all(&*self.db)
                    .await?
                    .into_iter()
                    .map(|a| a.work_order_id)
                    .collect();
                base.filter(
                    Condition::any()
                        .add(work_order::Column::RequesterId.eq(actor.id))
                        .add(work_order::Column::Id.is_in(assigned_ids)),
                )
                .all(&*self.db)
                .await?
            }
        };

        Ok(models.into_iter().map(WorkOrderSummary::from_model).collect())
    }

    /// Hides a work order from every listing and lookup. History and the
    /// allocated display number are retained.
    #[instrument(skip(self), fields(actor = %actor.id, %work_order_id))]
    pub async fn soft_delete(
        &self,
        actor: &AuthUser,
        work_order_id: Uuid,
    ) -> Result<(), ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "only administrators may delete work orders".to_string(),
            ));
        }

        let wo = self.load_live(work_order_id).await?;

        let updated = work_order::Entity::update_many()
            .col_expr(work_order::Column::IsDeleted, Expr::value(true))
            .col_expr(work_order::Column::Version, Expr::value(wo.version + 1))
            .col_expr(work_order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(work_order::Column::Id.eq(work_order_id))
            .filter(work_order::Column::Version.eq(wo.version))
            .exec(&*self.db)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "work order {} changed concurrently, re-read and retry",
                wo.wo_number
            )));
        }

        self.emit(Event::WorkOrderDeleted(work_order_id)).await;
        Ok(())
    }

    async fn load_live(&self, id: Uuid) -> Result<work_order::Model, ServiceError> {
        work_order::Entity::find_by_id(id)
            .filter(work_order::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("work order {} not found", id)))
    }

    async fn assignee_ids(&self, work_order_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let rows = work_order_assignee::Entity::find()
            .filter(work_order_assignee::Column::WorkOrderId.eq(work_order_id))
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    async fn capabilities_of(
        &self,
        actor: &AuthUser,
        organization: Organization,
    ) -> Result<Capabilities, ServiceError> {
        let supervised = self
            .directory
            .list_departments(DepartmentFilter {
                supervisor: Some(actor.id),
                organization: Some(organization),
            })
            .await?;
        Ok(Capabilities {
            is_admin: actor.is_admin(),
            supervised_departments: supervised.into_iter().map(|d| d.id).collect(),
        })
    }

    /// First department of `department_ids` that belongs to `organization`.
    async fn department_in_organization(
        &self,
        department_ids: &[Uuid],
        organization: Organization,
    ) -> Result<Option<Department>, ServiceError> {
        for dept_id in department_ids {
            if let Some(dept) = self.directory.get_department(*dept_id).await? {
                if dept.organization == organization {
                    return Ok(Some(dept));
                }
            }
        }
        Ok(None)
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!("failed to send event: {}", e);
            }
        }
    }

    /// Notifies the first decision maker after creation. Runs detached;
    /// the creation already committed.
    fn notify_created(&self, wo: &work_order::Model, actor_id: Uuid, bypassed: bool) {
        let directory = Arc::clone(&self.directory);
        let notifier = Arc::clone(&self.notifier);
        let snapshot = WorkOrderSnapshot {
            id: wo.id,
            wo_number: wo.wo_number.clone(),
            title: wo.title.clone(),
        };
        let notice = TransitionNotice {
            action: "CREATE".to_string(),
            to_status: wo.status,
            note: None,
            performed_by: actor_id,
        };
        let decision_department = if bypassed {
            wo.target_department_id
        } else {
            wo.requester_department_id
        };

        tokio::spawn(async move {
            let recipients = match directory.get_department(decision_department).await {
                Ok(Some(dept)) => vec![dept.supervisor_id],
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(error = %e, work_order_id = %snapshot.id, "recipient lookup failed after creation");
                    Vec::new()
                }
            };
            notifier.on_transition(snapshot, notice, recipients).await;
        });
    }

    /// Fans out a committed transition to its recipients. Runs detached.
    fn notify_transition(
        &self,
        wo: &work_order::Model,
        actor_id: Uuid,
        action: WorkOrderAction,
        to_status: WorkOrderStatus,
        note: String,
        assigned_staff: Vec<Uuid>,
    ) {
        let directory = Arc::clone(&self.directory);
        let notifier = Arc::clone(&self.notifier);
        let snapshot = WorkOrderSnapshot {
            id: wo.id,
            wo_number: wo.wo_number.clone(),
            title: wo.title.clone(),
        };
        let notice = TransitionNotice {
            action: action.to_string(),
            to_status,
            note: Some(note),
            performed_by: actor_id,
        };
        let ctx = RecipientContext {
            requester_id: wo.requester_id,
            requester_department_id: wo.requester_department_id,
            target_department_id: wo.target_department_id,
            assigned_staff,
        };

        tokio::spawn(async move {
            let recipients = match compute_recipients(&directory, &ctx, action, to_status).await {
                Ok(recipients) => recipients,
                Err(e) => {
                    warn!(error = %e, work_order_id = %snapshot.id, "recipient computation failed");
                    return;
                }
            };
            notifier.on_transition(snapshot, notice, recipients).await;
        });
    }
}
