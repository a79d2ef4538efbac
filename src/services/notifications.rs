//! Notification Coordinator: reacts to committed transitions.
//!
//! Strictly a read-only consumer of the new state. Every failure on this
//! path is absorbed into the delivery log and a warning; nothing here can
//! roll back or delay the transition that triggered it.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    directory::DirectoryService,
    entities::{
        delivery_log::{self, DeliveryOutcome},
        WorkOrderStatus,
    },
    errors::ServiceError,
    services::transitions::WorkOrderAction,
};

/// Transport error from the external dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// Long-lived, externally owned dispatcher handle. The coordinator depends
/// only on this capability, never on the dispatcher's internal readiness
/// or reconnection state.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn deliver(&self, address: &str, body: &str) -> Result<(), DispatchError>;
}

/// Posts `{to, body}` to a configured webhook endpoint.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl MessageDispatcher for WebhookDispatcher {
    async fn deliver(&self, address: &str, body: &str) -> Result<(), DispatchError> {
        let payload = serde_json::json!({ "to": address, "body": body });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Fallback dispatcher used when no webhook is configured.
pub struct LogOnlyDispatcher;

#[async_trait]
impl MessageDispatcher for LogOnlyDispatcher {
    async fn deliver(&self, address: &str, body: &str) -> Result<(), DispatchError> {
        info!(to = %address, body_len = body.len(), "notification delivery (log-only dispatcher)");
        Ok(())
    }
}

/// Read-only view of the work order handed to the coordinator.
#[derive(Debug, Clone)]
pub struct WorkOrderSnapshot {
    pub id: Uuid,
    pub wo_number: String,
    pub title: String,
}

/// The committed transition being announced.
#[derive(Debug, Clone)]
pub struct TransitionNotice {
    pub action: String,
    pub to_status: WorkOrderStatus,
    pub note: Option<String>,
    pub performed_by: Uuid,
}

/// Work order fields needed to compute recipients for a transition.
#[derive(Debug, Clone)]
pub struct RecipientContext {
    pub requester_id: Uuid,
    pub requester_department_id: Uuid,
    pub target_department_id: Uuid,
    pub assigned_staff: Vec<Uuid>,
}

/// Computes the recipient set for a committed action, mirroring who each
/// stage of the pipeline concerns:
/// approvals flow forward to the next decision maker, rejections flow back
/// to whoever submitted the rejected step, and fulfillment updates go to
/// the supervisors responsible for the assigned staff.
pub async fn compute_recipients(
    directory: &Arc<dyn DirectoryService>,
    ctx: &RecipientContext,
    action: WorkOrderAction,
    to_status: WorkOrderStatus,
) -> Result<Vec<Uuid>, ServiceError> {
    let mut recipients = BTreeSet::new();

    match (action, to_status) {
        (WorkOrderAction::Approve, WorkOrderStatus::WaitingTargetReview) => {
            if let Some(dept) = directory.get_department(ctx.target_department_id).await? {
                recipients.insert(dept.supervisor_id);
            }
        }
        (WorkOrderAction::Reject, WorkOrderStatus::RejectedBySupervisor) => {
            recipients.insert(ctx.requester_id);
        }
        (WorkOrderAction::Approve, WorkOrderStatus::AssignedToStaff) => {
            recipients.extend(ctx.assigned_staff.iter().copied());
        }
        (WorkOrderAction::Reject, WorkOrderStatus::RejectedByTargetSupervisor) => {
            if let Some(dept) = directory.get_department(ctx.requester_department_id).await? {
                recipients.insert(dept.supervisor_id);
            }
        }
        (WorkOrderAction::StartWork, _) => {
            recipients.extend(supervisors_of_staff(directory, &ctx.assigned_staff).await?);
        }
        (WorkOrderAction::RequestConfirmation, _) => {
            recipients.insert(ctx.requester_id);
        }
        (WorkOrderAction::ConfirmCompletion, _) => {
            recipients.extend(supervisors_of_staff(directory, &ctx.assigned_staff).await?);
            if let Some(dept) = directory.get_department(ctx.target_department_id).await? {
                recipients.insert(dept.supervisor_id);
            }
        }
        (WorkOrderAction::RejectResult, _) => {
            recipients.extend(ctx.assigned_staff.iter().copied());
        }
        _ => {}
    }

    Ok(recipients.into_iter().collect())
}

/// Supervisors of every department the assigned staff belong to, deduped.
async fn supervisors_of_staff(
    directory: &Arc<dyn DirectoryService>,
    staff_ids: &[Uuid],
) -> Result<BTreeSet<Uuid>, ServiceError> {
    let staff = directory.find_users(staff_ids).await?;

    let mut department_ids = BTreeSet::new();
    for member in &staff {
        department_ids.extend(member.department_ids.iter().copied());
    }

    let mut supervisors = BTreeSet::new();
    for dept_id in department_ids {
        if let Some(dept) = directory.get_department(dept_id).await? {
            supervisors.insert(dept.supervisor_id);
        }
    }
    Ok(supervisors)
}

/// Renders the notification body for one recipient.
pub fn render_message(
    snapshot: &WorkOrderSnapshot,
    notice: &TransitionNotice,
    recipient_name: &str,
    sender_name: &str,
) -> String {
    let mut lines = vec![
        "[NOTIF] Work Order".to_string(),
        String::new(),
        format!("WO Number: {}", snapshot.wo_number),
        format!("Title: {}", snapshot.title),
        format!("Status: {}", notice.to_status),
        String::new(),
        format!("Sent to: {}", recipient_name),
        format!("By: {}", sender_name),
    ];
    if let Some(note) = &notice.note {
        lines.push(format!("Note: {}", note));
    }
    lines.push(String::new());
    lines.push("This is an automated message".to_string());
    lines.join("\n")
}

/// Hands committed transitions to the external dispatcher and records
/// every attempt in `delivery_logs`.
#[derive(Clone)]
pub struct NotificationCoordinator {
    db: Arc<DbPool>,
    directory: Arc<dyn DirectoryService>,
    dispatcher: Arc<dyn MessageDispatcher>,
}

impl NotificationCoordinator {
    pub fn new(
        db: Arc<DbPool>,
        directory: Arc<dyn DirectoryService>,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> Self {
        Self {
            db,
            directory,
            dispatcher,
        }
    }

    /// Announces one committed transition to the given recipients.
    ///
    /// Never returns an error: directory failures, transport failures, and
    /// even delivery-log write failures degrade to warnings.
    pub async fn on_transition(
        &self,
        snapshot: WorkOrderSnapshot,
        notice: TransitionNotice,
        recipients: Vec<Uuid>,
    ) {
        if recipients.is_empty() {
            return;
        }

        let sender_name = match self.directory.get_user(notice.performed_by).await {
            Ok(Some(user)) => user.name,
            Ok(None) => notice.performed_by.to_string(),
            Err(e) => {
                warn!(error = %e, work_order_id = %snapshot.id, "failed to resolve notification sender");
                notice.performed_by.to_string()
            }
        };

        let users = match self.directory.find_users(&recipients).await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, work_order_id = %snapshot.id, "failed to resolve notification recipients");
                return;
            }
        };

        for user in users {
            let Some(phone) = user.phone.clone() else {
                // No channel address; nothing to attempt or log.
                continue;
            };

            let body = render_message(&snapshot, &notice, &user.name, &sender_name);
            let outcome = self.dispatcher.deliver(&phone, &body).await;

            let (status, raw_error, sent_at) = match &outcome {
                Ok(()) => (DeliveryOutcome::Sent, None, Some(Utc::now())),
                Err(e) => {
                    warn!(
                        error = %e,
                        work_order_id = %snapshot.id,
                        recipient = %user.id,
                        "notification delivery failed"
                    );
                    (DeliveryOutcome::Failed, Some(e.to_string()), None)
                }
            };

            let log_entry = delivery_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                work_order_id: Set(snapshot.id),
                recipient_id: Set(user.id),
                channel_address: Set(phone),
                message_body: Set(body),
                outcome: Set(status),
                raw_error: Set(raw_error),
                sent_at: Set(sent_at),
                created_at: Set(Utc::now()),
            };

            if let Err(e) = log_entry.insert(&*self.db).await {
                warn!(error = %e, work_order_id = %snapshot.id, "failed to persist delivery log entry");
            }
        }
    }
}
