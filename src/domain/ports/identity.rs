//! Identity and role lookup ports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// The user the sentinel acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

/// Resolves the current user. Read once per session bootstrap.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> DomainResult<Identity>;
}

/// Role membership lookup, queried on every remediation attempt.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn has_role(&self, identity_id: &str, role_id: &str) -> DomainResult<bool>;
}
