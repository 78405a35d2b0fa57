//! Authorization support types.
//!
//! Identity is established upstream; the billing core only sees an `Actor`
//! and decides whether it may touch a resource owned by some user.

use super::{DomainError, ErrorCode, UserId};

/// The party performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Grants access to the owner or to an administrator.
    pub fn ensure_owner_or_admin(
        &self,
        owner: &UserId,
        resource_type: &'static str,
        resource_id: impl Into<String>,
    ) -> Result<(), DomainError> {
        if self.is_admin || &self.user_id == owner {
            return Ok(());
        }
        Err(self.denied(resource_type, resource_id, "not the owner"))
    }

    /// Grants access to administrators only.
    pub fn ensure_admin(
        &self,
        resource_type: &'static str,
        resource_id: impl Into<String>,
    ) -> Result<(), DomainError> {
        if self.is_admin {
            return Ok(());
        }
        Err(self.denied(resource_type, resource_id, "administrator required"))
    }

    fn denied(
        &self,
        resource_type: &'static str,
        resource_id: impl Into<String>,
        reason: &str,
    ) -> DomainError {
        tracing::info!(
            user_id = %self.user_id,
            resource_type,
            reason,
            "access denied"
        );
        DomainError::new(ErrorCode::Forbidden, format!("Access denied: {}", reason))
            .with_detail("resource_type", resource_type)
            .with_detail("resource_id", resource_id.into())
            .with_detail("user_id", self.user_id.to_string())
    }
}
