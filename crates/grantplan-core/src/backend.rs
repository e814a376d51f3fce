//! The authorization backend capability the engine is written against.
//!
//! The engine itself performs no I/O; all reads and mutations of the
//! authorization service go through [`AuthorizationBackend`], so the
//! orchestration logic is fully testable with a fake implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{
    ManagedIdentity, PolicyAssignmentId, PrincipalId, PrincipalKind, RoleDefinitionId, Scope,
};

/// Errors surfaced by an authorization backend.
///
/// The engine never aborts a plan on a backend error; every call site maps
/// failures into a per-record outcome and continues.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("transport failure during {operation}: {message}")]
    Transport {
        /// Backend operation that failed.
        operation: &'static str,
        /// Underlying failure description.
        message: String,
    },

    /// The service answered with an unexpected status.
    #[error("unexpected status {status} during {operation}: {body}")]
    Status {
        /// Backend operation that failed.
        operation: &'static str,
        /// HTTP-style status code.
        status: u16,
        /// Response body, best effort.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode {operation} response: {message}")]
    Decode {
        /// Backend operation that failed.
        operation: &'static str,
        /// Underlying decode failure.
        message: String,
    },

    /// The addressed binding does not exist.
    #[error("no binding for principal {principal_id} at {scope}")]
    NotFound {
        /// Principal of the missing binding.
        principal_id: PrincipalId,
        /// Scope of the missing binding.
        scope: Scope,
    },
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Creation request for a single binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRequest {
    /// Principal being granted the role.
    pub principal_id: PrincipalId,
    /// Kind of principal, when known.
    #[serde(default)]
    pub object_type: Option<PrincipalKind>,
    /// Resource path the binding applies to.
    pub scope: Scope,
    /// Role definition being bound.
    pub role_definition_id: RoleDefinitionId,
}

/// A binding the service acknowledged creating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBinding {
    /// Service-assigned id of the new binding.
    pub id: String,
}

/// Remote operations against the authorization service.
///
/// A `None` from [`lookup_assignment_identity`](Self::lookup_assignment_identity)
/// means the assignment exists but carries no managed identity. A `None`
/// from [`create_binding`](Self::create_binding) means the service accepted
/// the call but produced no binding; the engine treats it as a transient
/// failure and retries.
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    /// Fetch the managed identity of a policy assignment.
    async fn lookup_assignment_identity(
        &self,
        assignment_id: &PolicyAssignmentId,
    ) -> BackendResult<Option<ManagedIdentity>>;

    /// Check whether a (scope, principal, role definition) binding exists.
    ///
    /// An empty result set from the service means "does not exist", not an
    /// error.
    async fn binding_exists(
        &self,
        scope: &Scope,
        principal_id: &PrincipalId,
        role_definition_id: &RoleDefinitionId,
    ) -> BackendResult<bool>;

    /// Create a binding.
    async fn create_binding(
        &self,
        request: &BindingRequest,
    ) -> BackendResult<Option<CreatedBinding>>;

    /// Delete a binding, best effort.
    async fn delete_binding(
        &self,
        scope: &Scope,
        principal_id: &PrincipalId,
        role_definition_id: &RoleDefinitionId,
    ) -> BackendResult<()>;
}
