//! Embedded schema migrations, run at startup when `auto_migrate` is set.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20250901_000001_create_work_order_tables::Migration,
        )]
    }
}

mod m20250901_000001_create_work_order_tables {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Departments::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Departments::Name).string().not_null())
                        .col(ColumnDef::new(Departments::Code).string_len(16).not_null())
                        .col(ColumnDef::new(Departments::Organization).string_len(8).not_null())
                        .col(ColumnDef::new(Departments::SupervisorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Departments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Departments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Department codes are unique within an organization.
            manager
                .create_index(
                    Index::create()
                        .name("idx_departments_org_code")
                        .table(Departments::Table)
                        .col(Departments::Organization)
                        .col(Departments::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Phone).string().null())
                        .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                        .col(ColumnDef::new(Users::Organizations).json().not_null())
                        .col(ColumnDef::new(Users::DepartmentIds).json().not_null())
                        .col(ColumnDef::new(Users::IsActive).boolean().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(WorkOrders::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(WorkOrders::Organization).string_len(8).not_null())
                        .col(
                            ColumnDef::new(WorkOrders::RequesterDepartmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::TargetDepartmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::RequesterId).uuid().not_null())
                        .col(ColumnDef::new(WorkOrders::Title).string().not_null())
                        .col(ColumnDef::new(WorkOrders::Description).text().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::IncidentDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::Attachments).json().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::ResultAttachments)
                                .json()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::Status).string_len(40).not_null())
                        .col(
                            ColumnDef::new(WorkOrders::WoNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(WorkOrders::IsDeleted).boolean().not_null())
                        .col(ColumnDef::new(WorkOrders::Version).integer().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderHistory::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderHistory::WorkOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderHistory::Position)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrderHistory::Action).string_len(40).not_null())
                        .col(ColumnDef::new(WorkOrderHistory::FromStatus).string_len(40).null())
                        .col(ColumnDef::new(WorkOrderHistory::ToStatus).string_len(40).not_null())
                        .col(ColumnDef::new(WorkOrderHistory::Note).text().null())
                        .col(
                            ColumnDef::new(WorkOrderHistory::PerformedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderHistory::AffectedStaffIds)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderHistory::ActorRole)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_history_wo_position")
                        .table(WorkOrderHistory::Table)
                        .col(WorkOrderHistory::WorkOrderId)
                        .col(WorkOrderHistory::Position)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderAssignees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderAssignees::WorkOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrderAssignees::UserId).uuid().not_null())
                        .col(
                            ColumnDef::new(WorkOrderAssignees::AssignedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(WorkOrderAssignees::WorkOrderId)
                                .col(WorkOrderAssignees::UserId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderCounters::Organization)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCounters::DepartmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCounters::Seq)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCounters::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(WorkOrderCounters::Organization)
                                .col(WorkOrderCounters::DepartmentId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryLogs::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DeliveryLogs::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(DeliveryLogs::RecipientId).uuid().not_null())
                        .col(
                            ColumnDef::new(DeliveryLogs::ChannelAddress)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryLogs::MessageBody).text().not_null())
                        .col(ColumnDef::new(DeliveryLogs::Outcome).string_len(16).not_null())
                        .col(ColumnDef::new(DeliveryLogs::RawError).text().null())
                        .col(
                            ColumnDef::new(DeliveryLogs::SentAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrderCounters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrderAssignees::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrderHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Departments {
        Table,
        Id,
        Name,
        Code,
        Organization,
        SupervisorId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        Phone,
        Role,
        Organizations,
        DepartmentIds,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkOrders {
        Table,
        Id,
        Organization,
        RequesterDepartmentId,
        TargetDepartmentId,
        RequesterId,
        Title,
        Description,
        IncidentDate,
        Attachments,
        ResultAttachments,
        Status,
        WoNumber,
        IsDeleted,
        Version,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkOrderHistory {
        Table,
        Id,
        WorkOrderId,
        Position,
        Action,
        FromStatus,
        ToStatus,
        Note,
        PerformedBy,
        AffectedStaffIds,
        ActorRole,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkOrderAssignees {
        Table,
        WorkOrderId,
        UserId,
        AssignedAt,
    }

    #[derive(DeriveIden)]
    enum WorkOrderCounters {
        Table,
        Organization,
        DepartmentId,
        Seq,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryLogs {
        Table,
        Id,
        WorkOrderId,
        RecipientId,
        ChannelAddress,
        MessageBody,
        Outcome,
        RawError,
        SentAt,
        CreatedAt,
    }
}
