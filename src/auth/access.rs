//! Ownership rules for custom builds, defined once and used by both the
//! build store (inside its transactions) and the build service.

use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(&'static str),
}

impl Access {
    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            Access::Allowed => Ok(()),
            Access::Denied(reason) => Err(ApiError::forbidden(reason)),
        }
    }
}

/// Only the owner may change or delete a build.
pub fn build_write(owner_id: Uuid, user_id: Uuid) -> Access {
    if owner_id == user_id {
        Access::Allowed
    } else {
        Access::Denied("you can only modify your own builds")
    }
}

/// Owners read their builds; admins may read any build.
pub fn build_read(owner_id: Uuid, user_id: Uuid, role: &str) -> Access {
    if owner_id == user_id || role == super::ROLE_ADMIN {
        Access::Allowed
    } else {
        Access::Denied("you can only view your own builds")
    }
}
