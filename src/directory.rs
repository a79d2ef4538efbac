//! Read-only access to the directory collaborator (departments, users).
//!
//! The lifecycle engine never owns this data; any read may be stale.
//! Transport failures surface as `DependencyUnavailable`.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{department, user, Organization, UserRole},
    errors::ServiceError,
};

/// Department as seen by the core.
#[derive(Debug, Clone)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub organization: Organization,
    pub supervisor_id: Uuid,
}

/// User as seen by the core.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub organizations: Vec<Organization>,
    pub department_ids: Vec<Uuid>,
}

/// Filter for `list_departments`.
#[derive(Debug, Clone, Default)]
pub struct DepartmentFilter {
    pub supervisor: Option<Uuid>,
    pub organization: Option<Organization>,
}

#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn get_department(&self, id: Uuid) -> Result<Option<Department>, ServiceError>;
    async fn list_departments(
        &self,
        filter: DepartmentFilter,
    ) -> Result<Vec<Department>, ServiceError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<DirectoryUser>, ServiceError>;
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<DirectoryUser>, ServiceError>;
}

/// Directory backed by the shared database.
#[derive(Clone)]
pub struct DbDirectory {
    db: Arc<DbPool>,
}

impl DbDirectory {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

fn unavailable(e: sea_orm::DbErr) -> ServiceError {
    ServiceError::DependencyUnavailable(format!("directory lookup failed: {}", e))
}

impl From<department::Model> for Department {
    fn from(m: department::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            organization: m.organization,
            supervisor_id: m.supervisor_id,
        }
    }
}

impl From<user::Model> for DirectoryUser {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            role: m.role,
            phone: m.phone,
            organizations: m.organizations.0,
            department_ids: m.department_ids.0,
        }
    }
}

#[async_trait]
impl DirectoryService for DbDirectory {
    async fn get_department(&self, id: Uuid) -> Result<Option<Department>, ServiceError> {
        let dept = department::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(unavailable)?;
        Ok(dept.map(Into::into))
    }

    async fn list_departments(
        &self,
        filter: DepartmentFilter,
    ) -> Result<Vec<Department>, ServiceError> {
        let mut query = department::Entity::find();
        if let Some(supervisor) = filter.supervisor {
            query = query.filter(department::Column::SupervisorId.eq(supervisor));
        }
        if let Some(org) = filter.organization {
            query = query.filter(department::Column::Organization.eq(org));
        }
        let depts = query.all(&*self.db).await.map_err(unavailable)?;
        Ok(depts.into_iter().map(Into::into).collect())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<DirectoryUser>, ServiceError> {
        let user = user::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(unavailable)?;
        Ok(user.map(Into::into))
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<DirectoryUser>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await
            .map_err(unavailable)?;
        Ok(users.into_iter().map(Into::into).collect())
    }
}
