use super::{Role, UserSession};
use crate::error::ServiceError;

/// Capabilities guarded by a role allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    AuditRead,
    DocumentReview,
    SchemaWrite,
    FormModerate,
    FormReview,
}

impl Permission {
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Permission::AuditRead => &[Role::SecurityAdmin, Role::Validator],
            Permission::DocumentReview => {
                &[Role::DocAnalyst, Role::Validator, Role::SecurityAdmin]
            }
            Permission::SchemaWrite => &[Role::TemplateCreator, Role::SecurityAdmin],
            Permission::FormModerate => &[Role::SecurityAdmin],
            Permission::FormReview => &[Role::DocAnalyst, Role::Validator, Role::SecurityAdmin],
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

pub fn authorize(session: &UserSession, permission: Permission) -> Result<(), ServiceError> {
    if permission.permits(session.role) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("insufficient permissions"))
    }
}
