//! The work order transition table.
//!
//! Each row pairs a (current status, action) with the authorization rule
//! that must hold and the resulting status. Adding a state or action is a
//! table change, not a control-flow change; "is this action valid here" is
//! answered once, generically, by `resolve`.

use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::WorkOrderStatus;

/// Verbs a caller can apply to a work order after creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderAction {
    #[serde(alias = "approve")]
    Approve,
    #[serde(alias = "reject")]
    Reject,
    StartWork,
    RequestConfirmation,
    ConfirmCompletion,
    RejectResult,
}

/// Who may perform a transition, expressed as a capability predicate
/// instead of a role-string comparison. Admins bypass every rule (but not
/// the state-applicability check).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRule {
    /// Actor supervises the work order's requester department.
    RequesterDepartmentSupervisor,
    /// Actor supervises the work order's target department.
    TargetDepartmentSupervisor,
    /// Actor is one of the assigned staff.
    AssignedStaff,
    /// Actor created the work order.
    Requester,
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    pub from: WorkOrderStatus,
    pub action: WorkOrderAction,
    pub authorize: AuthRule,
    pub to: WorkOrderStatus,
    /// History note recorded for the transition.
    pub default_note: &'static str,
    /// Whether a caller-provided note replaces the default. Approvals
    /// always record the fixed wording; rejections and progress actions
    /// carry the actor's own note when given.
    pub note_overridable: bool,
}

pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: WorkOrderStatus::WaitingSupervisorApproval,
        action: WorkOrderAction::Approve,
        authorize: AuthRule::RequesterDepartmentSupervisor,
        to: WorkOrderStatus::WaitingTargetReview,
        default_note: "Approved by supervisor",
        note_overridable: false,
    },
    TransitionRule {
        from: WorkOrderStatus::WaitingSupervisorApproval,
        action: WorkOrderAction::Reject,
        authorize: AuthRule::RequesterDepartmentSupervisor,
        to: WorkOrderStatus::RejectedBySupervisor,
        default_note: "Rejected by supervisor",
        note_overridable: true,
    },
    TransitionRule {
        from: WorkOrderStatus::WaitingTargetReview,
        action: WorkOrderAction::Approve,
        authorize: AuthRule::TargetDepartmentSupervisor,
        to: WorkOrderStatus::AssignedToStaff,
        default_note: "Assigned to staff",
        note_overridable: false,
    },
    TransitionRule {
        from: WorkOrderStatus::WaitingTargetReview,
        action: WorkOrderAction::Reject,
        authorize: AuthRule::TargetDepartmentSupervisor,
        to: WorkOrderStatus::RejectedByTargetSupervisor,
        default_note: "Rejected by target supervisor",
        note_overridable: true,
    },
    TransitionRule {
        from: WorkOrderStatus::AssignedToStaff,
        action: WorkOrderAction::StartWork,
        authorize: AuthRule::AssignedStaff,
        to: WorkOrderStatus::InProgress,
        default_note: "Staff started working on this work order",
        note_overridable: true,
    },
    TransitionRule {
        from: WorkOrderStatus::InProgress,
        action: WorkOrderAction::RequestConfirmation,
        authorize: AuthRule::AssignedStaff,
        to: WorkOrderStatus::WaitingRequesterConfirmation,
        default_note: "Staff requested confirmation from requester",
        note_overridable: true,
    },
    TransitionRule {
        from: WorkOrderStatus::WaitingRequesterConfirmation,
        action: WorkOrderAction::ConfirmCompletion,
        authorize: AuthRule::Requester,
        to: WorkOrderStatus::Closed,
        default_note: "Requester confirmed completion",
        note_overridable: true,
    },
    TransitionRule {
        from: WorkOrderStatus::WaitingRequesterConfirmation,
        action: WorkOrderAction::RejectResult,
        authorize: AuthRule::Requester,
        to: WorkOrderStatus::InProgress,
        default_note: "Requester rejected result, returned to staff",
        note_overridable: true,
    },
];

/// Finds the rule for a (status, action) pair. `None` covers both "no such
/// action here" and terminal states.
pub fn resolve(from: WorkOrderStatus, action: WorkOrderAction) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .find(|rule| rule.from == from && rule.action == action)
}

/// Resolved capability set of an actor, evaluated against directory data
/// once per request.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub is_admin: bool,
    /// Departments the actor supervises in the active organization.
    pub supervised_departments: Vec<Uuid>,
}

impl Capabilities {
    pub fn supervises(&self, department_id: Uuid) -> bool {
        self.supervised_departments.contains(&department_id)
    }
}

/// Everything an authorization rule needs to know about the work order and
/// the actor.
#[derive(Debug)]
pub struct ActionContext<'a> {
    pub actor: Uuid,
    pub capabilities: &'a Capabilities,
    pub requester_id: Uuid,
    pub requester_department_id: Uuid,
    pub target_department_id: Uuid,
    pub assigned_staff: &'a [Uuid],
}

pub fn is_authorized(rule: &TransitionRule, ctx: &ActionContext<'_>) -> bool {
    if ctx.capabilities.is_admin {
        return true;
    }
    match rule.authorize {
        AuthRule::RequesterDepartmentSupervisor => {
            ctx.capabilities.supervises(ctx.requester_department_id)
        }
        AuthRule::TargetDepartmentSupervisor => {
            ctx.capabilities.supervises(ctx.target_department_id)
        }
        AuthRule::AssignedStaff => ctx.assigned_staff.contains(&ctx.actor),
        AuthRule::Requester => ctx.actor == ctx.requester_id,
    }
}
