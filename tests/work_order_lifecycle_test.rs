//! End-to-end lifecycle tests against an in-memory SQLite database.
//!
//! These exercise the service layer directly: creation, the approval
//! pipeline, authorization failures, visibility partitioning, display
//! number allocation, and delivery logging.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use workorder_api::{
    auth::AuthUser,
    db::DbPool,
    directory::{DbDirectory, DirectoryService},
    entities::{
        delivery_log,
        delivery_log::DeliveryOutcome,
        department, user, work_order, work_order_history, Organization, OrganizationList,
        UserRole, UuidList, WorkOrderStatus,
    },
    errors::ServiceError,
    migrator::Migrator,
    services::{
        notifications::{
            DispatchError, LogOnlyDispatcher, MessageDispatcher, NotificationCoordinator,
            TransitionNotice, WorkOrderSnapshot,
        },
        sequence::SequenceAllocator,
        transitions::WorkOrderAction,
        work_orders::{
            ActionRequest, CreateWorkOrderRequest, LifecyclePolicy, WorkOrderService,
        },
    },
};

struct Fixture {
    db: Arc<DbPool>,
    service: WorkOrderService,
    directory: Arc<dyn DirectoryService>,
    requester_dept: Uuid,
    second_requester_dept: Uuid,
    target_dept: Uuid,
    admin: AuthUser,
    requester: AuthUser,
    requester2: AuthUser,
    requester_supervisor: AuthUser,
    target_supervisor: AuthUser,
    staff: AuthUser,
    staff2: AuthUser,
    outsider: AuthUser,
}

fn principal(id: Uuid, role: UserRole) -> AuthUser {
    AuthUser {
        id,
        name: None,
        role,
        active_organization: Organization::Gd,
    }
}

async fn seed_user(
    db: &DbPool,
    id: Uuid,
    name: &str,
    role: UserRole,
    department_ids: Vec<Uuid>,
) {
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.org", name.to_lowercase().replace(' ', "."))),
        phone: Set(Some(format!("+62-{}", &id.simple().to_string()[..8]))),
        role: Set(role),
        organizations: Set(OrganizationList(vec![Organization::Gd])),
        department_ids: Set(UuidList(department_ids)),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed user");
}

async fn seed_department(
    db: &DbPool,
    id: Uuid,
    name: &str,
    code: &str,
    supervisor_id: Uuid,
) {
    department::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        organization: Set(Organization::Gd),
        supervisor_id: Set(supervisor_id),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed department");
}

async fn fixture_with_dispatcher(dispatcher: Arc<dyn MessageDispatcher>) -> Fixture {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1);
    let db = Arc::new(Database::connect(opts).await.expect("connect sqlite"));
    Migrator::up(&*db, None).await.expect("migrate");

    let requester_dept = Uuid::new_v4();
    let second_requester_dept = Uuid::new_v4();
    let target_dept = Uuid::new_v4();

    let admin_id = Uuid::new_v4();
    let requester_id = Uuid::new_v4();
    let requester2_id = Uuid::new_v4();
    let requester_supervisor_id = Uuid::new_v4();
    let target_supervisor_id = Uuid::new_v4();
    let staff_id = Uuid::new_v4();
    let staff2_id = Uuid::new_v4();
    let outsider_id = Uuid::new_v4();

    seed_department(&db, requester_dept, "Purchasing", "PCH", requester_supervisor_id).await;
    seed_department(
        &db,
        second_requester_dept,
        "General Affairs",
        "GA",
        requester_supervisor_id,
    )
    .await;
    seed_department(&db, target_dept, "Facilities", "FAC", target_supervisor_id).await;

    seed_user(&db, admin_id, "Admin", UserRole::Admin, vec![]).await;
    seed_user(&db, requester_id, "Rina Requester", UserRole::Requester, vec![requester_dept]).await;
    seed_user(
        &db,
        requester2_id,
        "Gita Requester",
        UserRole::Requester,
        vec![second_requester_dept],
    )
    .await;
    seed_user(
        &db,
        requester_supervisor_id,
        "Surya Supervisor",
        UserRole::Supervisor,
        vec![requester_dept],
    )
    .await;
    seed_user(
        &db,
        target_supervisor_id,
        "Tono Target",
        UserRole::Supervisor,
        vec![target_dept],
    )
    .await;
    seed_user(&db, staff_id, "Sari Staff", UserRole::Staff, vec![target_dept]).await;
    seed_user(&db, staff2_id, "Budi Staff", UserRole::Staff, vec![target_dept]).await;
    seed_user(&db, outsider_id, "Omar Outsider", UserRole::Requester, vec![requester_dept]).await;

    let directory: Arc<dyn DirectoryService> = Arc::new(DbDirectory::new(Arc::clone(&db)));
    let notifier = Arc::new(NotificationCoordinator::new(
        Arc::clone(&db),
        Arc::clone(&directory),
        dispatcher,
    ));
    let service = WorkOrderService::new(
        Arc::clone(&db),
        Arc::clone(&directory),
        notifier,
        None,
        LifecyclePolicy::default(),
    );

    Fixture {
        db,
        service,
        directory,
        requester_dept,
        second_requester_dept,
        target_dept,
        admin: principal(admin_id, UserRole::Admin),
        requester: principal(requester_id, UserRole::Requester),
        requester2: principal(requester2_id, UserRole::Requester),
        requester_supervisor: principal(requester_supervisor_id, UserRole::Supervisor),
        target_supervisor: principal(target_supervisor_id, UserRole::Supervisor),
        staff: principal(staff_id, UserRole::Staff),
        staff2: principal(staff2_id, UserRole::Staff),
        outsider: principal(outsider_id, UserRole::Requester),
    }
}

async fn fixture() -> Fixture {
    fixture_with_dispatcher(Arc::new(LogOnlyDispatcher)).await
}

fn create_request(target_department_id: Uuid) -> CreateWorkOrderRequest {
    CreateWorkOrderRequest {
        target_department_id,
        title: "Broken air conditioner".to_string(),
        description: "Unit in meeting room 2 leaks and no longer cools.".to_string(),
        incident_date: Utc::now(),
        attachments: vec!["photos/ac-leak.jpg".to_string()],
    }
}

fn action(action: WorkOrderAction) -> ActionRequest {
    ActionRequest {
        action,
        note: None,
        assigned_staff_ids: Vec::new(),
        result_attachments: Vec::new(),
    }
}

#[tokio::test]
async fn requester_creation_starts_at_supervisor_approval() {
    let f = fixture().await;

    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    assert_eq!(wo.status, WorkOrderStatus::WaitingSupervisorApproval);
    assert_eq!(wo.wo_number, "WO/GD/PCH/001");
    assert_eq!(wo.requester_department_id, f.requester_dept);
    assert_eq!(wo.version, 1);

    let detail = f
        .service
        .get_with_context(&f.requester, wo.id)
        .await
        .expect("detail");
    assert_eq!(detail.history.len(), 1);
    assert_eq!(detail.history[0].action, "CREATE");
    assert_eq!(detail.history[0].from_status, None);
    assert_eq!(
        detail.history[0].to_status,
        WorkOrderStatus::WaitingSupervisorApproval
    );
    assert_eq!(
        detail.history[0].note.as_deref(),
        Some("Work order created by requester")
    );
}

#[tokio::test]
async fn supervisor_creation_skips_first_approval() {
    let f = fixture().await;

    let wo = f
        .service
        .create(&f.requester_supervisor, create_request(f.target_dept))
        .await
        .expect("create");

    assert_eq!(wo.status, WorkOrderStatus::WaitingTargetReview);

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(
        detail.history[0].note.as_deref(),
        Some("Work order created by supervisor")
    );
}

#[tokio::test]
async fn display_numbers_are_contiguous_per_requester_department() {
    let f = fixture().await;

    let first = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("first");
    let second = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("second");
    // Different requester department, independent counter scope.
    let other = f
        .service
        .create(&f.requester2, create_request(f.target_dept))
        .await
        .expect("other requester dept");

    assert_eq!(first.wo_number, "WO/GD/PCH/001");
    assert_eq!(second.wo_number, "WO/GD/PCH/002");
    assert_eq!(other.wo_number, "WO/GD/GA/001");
    assert_eq!(other.requester_department_id, f.second_requester_dept);
}

#[tokio::test]
async fn concurrent_creations_never_share_a_number() {
    let f = fixture().await;
    let service = f.service.clone();

    let (a, b, c) = tokio::join!(
        service.create(&f.requester, create_request(f.target_dept)),
        service.create(&f.requester, create_request(f.target_dept)),
        service.create(&f.requester, create_request(f.target_dept)),
    );

    let mut numbers: Vec<String> = [a, b, c]
        .into_iter()
        .map(|r| r.expect("create").wo_number)
        .collect();
    numbers.sort();
    assert_eq!(
        numbers,
        vec!["WO/GD/PCH/001", "WO/GD/PCH/002", "WO/GD/PCH/003"]
    );
}

#[tokio::test]
async fn allocation_rolls_back_with_the_creating_transaction() {
    let f = fixture().await;

    let txn = f.db.begin().await.expect("begin");
    let seq = SequenceAllocator::next(&txn, Organization::Gd, f.requester_dept)
        .await
        .expect("allocate");
    assert_eq!(seq, 1);
    txn.rollback().await.expect("rollback");

    // The abandoned allocation left no gap.
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");
    assert_eq!(wo.wo_number, "WO/GD/PCH/001");
}

#[tokio::test]
async fn full_lifecycle_reaches_closed_with_complete_history() {
    let f = fixture().await;

    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let wo = f
        .service
        .apply_action(&f.requester_supervisor, wo.id, action(WorkOrderAction::Approve))
        .await
        .expect("supervisor approve");
    assert_eq!(wo.status, WorkOrderStatus::WaitingTargetReview);

    let mut assign = action(WorkOrderAction::Approve);
    assign.assigned_staff_ids = vec![f.staff.id, f.staff2.id];
    let wo = f
        .service
        .apply_action(&f.target_supervisor, wo.id, assign)
        .await
        .expect("target approve");
    assert_eq!(wo.status, WorkOrderStatus::AssignedToStaff);
    assert_eq!(wo.assigned_staff_ids.len(), 2);

    let wo = f
        .service
        .apply_action(&f.staff, wo.id, action(WorkOrderAction::StartWork))
        .await
        .expect("start work");
    assert_eq!(wo.status, WorkOrderStatus::InProgress);

    let mut done = action(WorkOrderAction::RequestConfirmation);
    done.result_attachments = vec!["photos/fixed.jpg".to_string()];
    let wo = f
        .service
        .apply_action(&f.staff, wo.id, done)
        .await
        .expect("request confirmation");
    assert_eq!(wo.status, WorkOrderStatus::WaitingRequesterConfirmation);
    assert_eq!(wo.result_attachments, vec!["photos/fixed.jpg"]);

    // Requester is not satisfied; work resumes and evidence is kept.
    let wo = f
        .service
        .apply_action(&f.requester, wo.id, action(WorkOrderAction::RejectResult))
        .await
        .expect("reject result");
    assert_eq!(wo.status, WorkOrderStatus::InProgress);
    assert_eq!(wo.result_attachments, vec!["photos/fixed.jpg"]);

    let mut done = action(WorkOrderAction::RequestConfirmation);
    done.result_attachments = vec!["photos/fixed-again.jpg".to_string()];
    let wo = f
        .service
        .apply_action(&f.staff2, wo.id, done)
        .await
        .expect("second confirmation request");
    assert_eq!(
        wo.result_attachments,
        vec!["photos/fixed.jpg", "photos/fixed-again.jpg"]
    );

    let wo = f
        .service
        .apply_action(&f.requester, wo.id, action(WorkOrderAction::ConfirmCompletion))
        .await
        .expect("confirm completion");
    assert_eq!(wo.status, WorkOrderStatus::Closed);
    assert_eq!(wo.version, 8);

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(detail.history.len(), 8);
    let positions: Vec<i32> = detail.history.iter().map(|h| h.position).collect();
    assert_eq!(positions, (1..=8).collect::<Vec<_>>());
    assert_eq!(detail.history[1].note.as_deref(), Some("Approved by supervisor"));
    assert_eq!(
        detail.history[2].affected_staff_ids.len(),
        2,
        "assignment snapshot recorded"
    );
}

#[tokio::test]
async fn approval_note_keeps_fixed_wording() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let mut approve = action(WorkOrderAction::Approve);
    approve.note = Some("please expedite".to_string());
    f.service
        .apply_action(&f.requester_supervisor, wo.id, approve)
        .await
        .expect("approve");

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(
        detail.history[1].note.as_deref(),
        Some("Approved by supervisor")
    );
}

#[tokio::test]
async fn rejection_note_carries_caller_text() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let mut reject = action(WorkOrderAction::Reject);
    reject.note = Some("no budget left this quarter".to_string());
    f.service
        .apply_action(&f.requester_supervisor, wo.id, reject)
        .await
        .expect("reject");

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(
        detail.history[1].note.as_deref(),
        Some("no budget left this quarter")
    );
}

#[tokio::test]
async fn action_response_reflects_committed_state() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let response = f
        .service
        .apply_action(&f.requester_supervisor, wo.id, action(WorkOrderAction::Approve))
        .await
        .expect("approve");
    assert_eq!(response.status, WorkOrderStatus::WaitingTargetReview);
    assert_eq!(response.version, 2);

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(detail.work_order.status, response.status);
    assert_eq!(detail.work_order.version, response.version);
    assert_eq!(detail.work_order.result_attachments, response.result_attachments);
}

#[tokio::test]
async fn invalid_action_leaves_state_untouched() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let err = f
        .service
        .apply_action(&f.staff, wo.id, action(WorkOrderAction::StartWork))
        .await
        .expect_err("start before assignment");
    assert_matches!(err, ServiceError::InvalidAction(_));

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(
        detail.work_order.status,
        WorkOrderStatus::WaitingSupervisorApproval
    );
    assert_eq!(detail.history.len(), 1);
    assert_eq!(detail.work_order.version, 1);
}

#[tokio::test]
async fn unrelated_supervisor_is_forbidden() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    // Supervises the target department, not the requester's.
    let err = f
        .service
        .apply_action(&f.target_supervisor, wo.id, action(WorkOrderAction::Approve))
        .await
        .expect_err("wrong supervisor");
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn admin_may_perform_any_transition() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let wo = f
        .service
        .apply_action(&f.admin, wo.id, action(WorkOrderAction::Approve))
        .await
        .expect("admin approve");
    assert_eq!(wo.status, WorkOrderStatus::WaitingTargetReview);
}

#[tokio::test]
async fn assignment_requires_staff_ids() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester_supervisor, create_request(f.target_dept))
        .await
        .expect("create, already at target review");

    let err = f
        .service
        .apply_action(&f.target_supervisor, wo.id, action(WorkOrderAction::Approve))
        .await
        .expect_err("no staff given");
    assert_matches!(err, ServiceError::InvalidPayload(_));

    let mut unknown = action(WorkOrderAction::Approve);
    unknown.assigned_staff_ids = vec![Uuid::new_v4()];
    let err = f
        .service
        .apply_action(&f.target_supervisor, wo.id, unknown)
        .await
        .expect_err("unknown staff id");
    assert_matches!(err, ServiceError::InvalidPayload(_));
}

#[tokio::test]
async fn concurrent_decisions_admit_exactly_one_winner() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let service = f.service.clone();
    let (approve, reject) = tokio::join!(
        service.apply_action(
            &f.requester_supervisor,
            wo.id,
            action(WorkOrderAction::Approve)
        ),
        service.apply_action(
            &f.requester_supervisor,
            wo.id,
            action(WorkOrderAction::Reject)
        ),
    );

    let outcomes = [approve.is_ok(), reject.is_ok()];
    assert_eq!(
        outcomes.iter().filter(|ok| **ok).count(),
        1,
        "exactly one of two racing decisions may commit"
    );
    for result in [approve, reject] {
        if let Err(e) = result {
            assert_matches!(
                e,
                ServiceError::Conflict(_) | ServiceError::InvalidAction(_)
            );
        }
    }

    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(detail.history.len(), 2);
}

#[tokio::test]
async fn listing_is_partitioned_by_role() {
    let f = fixture().await;

    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");
    f.service
        .apply_action(&f.requester_supervisor, wo.id, action(WorkOrderAction::Approve))
        .await
        .expect("approve");
    let mut assign = action(WorkOrderAction::Approve);
    assign.assigned_staff_ids = vec![f.staff.id];
    f.service
        .apply_action(&f.target_supervisor, wo.id, assign)
        .await
        .expect("assign");

    assert_eq!(f.service.list(&f.admin).await.expect("admin list").len(), 1);
    assert_eq!(
        f.service.list(&f.requester).await.expect("requester list").len(),
        1
    );
    assert_eq!(f.service.list(&f.staff).await.expect("staff list").len(), 1);
    assert_eq!(
        f.service.list(&f.staff2).await.expect("unassigned staff").len(),
        0
    );
    assert_eq!(
        f.service.list(&f.outsider).await.expect("other requester").len(),
        0
    );
    assert_eq!(
        f.service
            .list(&f.requester_supervisor)
            .await
            .expect("requester-side supervisor")
            .len(),
        1
    );
    assert_eq!(
        f.service
            .list(&f.target_supervisor)
            .await
            .expect("target-side supervisor")
            .len(),
        1
    );

    // A supervisor with no department in this organization is misconfigured.
    let dangling = principal(Uuid::new_v4(), UserRole::Supervisor);
    let err = f.service.list(&dangling).await.expect_err("no departments");
    assert_matches!(err, ServiceError::NotConfigured(_));
}

#[tokio::test]
async fn detail_visibility_is_enforced() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let err = f
        .service
        .get_with_context(&f.outsider, wo.id)
        .await
        .expect_err("outsider");
    assert_matches!(err, ServiceError::Forbidden(_));

    let as_target = f
        .service
        .get_with_context(&f.target_supervisor, wo.id)
        .await
        .expect("target supervisor");
    assert!(as_target.supervisor_context.is_some());
    assert_eq!(as_target.requester_name.as_deref(), Some("Rina Requester"));
}

#[tokio::test]
async fn target_department_must_match_organization() {
    let f = fixture().await;

    let err = f
        .service
        .create(&f.requester, create_request(Uuid::new_v4()))
        .await
        .expect_err("unknown department");
    assert_matches!(err, ServiceError::DepartmentMismatch(_));
}

#[tokio::test]
async fn soft_delete_is_admin_only_and_hides_the_work_order() {
    let f = fixture().await;
    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let err = f
        .service
        .soft_delete(&f.requester, wo.id)
        .await
        .expect_err("non-admin delete");
    assert_matches!(err, ServiceError::Forbidden(_));

    f.service
        .soft_delete(&f.admin, wo.id)
        .await
        .expect("admin delete");

    let err = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect_err("deleted is invisible");
    assert_matches!(err, ServiceError::NotFound(_));
    assert_eq!(f.service.list(&f.admin).await.expect("list").len(), 0);

    // Row and history remain for audit.
    let row = work_order::Entity::find_by_id(wo.id)
        .one(&*f.db)
        .await
        .expect("query")
        .expect("row kept");
    assert!(row.is_deleted);
    let history = work_order_history::Entity::find()
        .filter(work_order_history::Column::WorkOrderId.eq(wo.id))
        .all(&*f.db)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
}

struct FailingDispatcher;

#[async_trait::async_trait]
impl MessageDispatcher for FailingDispatcher {
    async fn deliver(&self, _address: &str, _body: &str) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("gateway unreachable".to_string()))
    }
}

#[tokio::test]
async fn failed_delivery_is_logged_and_absorbed() {
    let f = fixture_with_dispatcher(Arc::new(FailingDispatcher)).await;

    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create despite broken dispatcher");

    // Drive the coordinator directly so the outcome is observable without
    // racing the detached post-commit task.
    let notifier = NotificationCoordinator::new(
        Arc::clone(&f.db),
        Arc::clone(&f.directory),
        Arc::new(FailingDispatcher),
    );
    notifier
        .on_transition(
            WorkOrderSnapshot {
                id: wo.id,
                wo_number: wo.wo_number.clone(),
                title: wo.title.clone(),
            },
            TransitionNotice {
                action: "CREATE".to_string(),
                to_status: wo.status,
                note: None,
                performed_by: f.requester.id,
            },
            vec![f.requester_supervisor.id],
        )
        .await;

    let logs = delivery_log::Entity::find()
        .filter(delivery_log::Column::WorkOrderId.eq(wo.id))
        .all(&*f.db)
        .await
        .expect("logs");
    assert!(!logs.is_empty());
    let entry = &logs[logs.len() - 1];
    assert_eq!(entry.outcome, DeliveryOutcome::Failed);
    assert!(entry.raw_error.as_deref().unwrap_or_default().contains("gateway unreachable"));
    assert!(entry.sent_at.is_none());

    // The work order itself is untouched by the delivery failure.
    let detail = f
        .service
        .get_with_context(&f.admin, wo.id)
        .await
        .expect("detail");
    assert_eq!(
        detail.work_order.status,
        WorkOrderStatus::WaitingSupervisorApproval
    );
}

#[tokio::test]
async fn successful_delivery_records_sent_outcome() {
    let f = fixture().await;

    let wo = f
        .service
        .create(&f.requester, create_request(f.target_dept))
        .await
        .expect("create");

    let notifier = NotificationCoordinator::new(
        Arc::clone(&f.db),
        Arc::clone(&f.directory),
        Arc::new(LogOnlyDispatcher),
    );
    notifier
        .on_transition(
            WorkOrderSnapshot {
                id: wo.id,
                wo_number: wo.wo_number.clone(),
                title: wo.title.clone(),
            },
            TransitionNotice {
                action: "APPROVE".to_string(),
                to_status: WorkOrderStatus::WaitingTargetReview,
                note: Some("Approved by supervisor".to_string()),
                performed_by: f.requester_supervisor.id,
            },
            vec![f.target_supervisor.id],
        )
        .await;

    let logs = delivery_log::Entity::find()
        .filter(delivery_log::Column::WorkOrderId.eq(wo.id))
        .filter(delivery_log::Column::RecipientId.eq(f.target_supervisor.id))
        .all(&*f.db)
        .await
        .expect("logs");
    assert!(logs.iter().any(|l| l.outcome == DeliveryOutcome::Sent && l.sent_at.is_some()));
    assert!(logs
        .iter()
        .any(|l| l.message_body.contains(&wo.wo_number)));
}
