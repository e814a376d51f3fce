//! Identifier newtypes and record shapes shared across the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a principal (user, group, or service identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a new principal ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the principal ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Resource path at which a binding is granted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Create a new scope.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    /// Get the scope as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Scope {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of the role definition being granted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleDefinitionId(String);

impl RoleDefinitionId {
    /// Create a new role definition ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the role definition ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleDefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoleDefinitionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RoleDefinitionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of the policy assignment that spawned an addition record.
///
/// Present on a record only when the principal id was unknown at plan time;
/// the assignment's managed identity supplies the principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyAssignmentId(String);

impl PolicyAssignmentId {
    /// Create a new policy assignment ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the policy assignment ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyAssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PolicyAssignmentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PolicyAssignmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of principal a binding grants a role to.
///
/// Plans produced by older tooling may carry object types this engine does
/// not know about; those round-trip through [`PrincipalKind::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrincipalKind {
    User,
    Group,
    ServicePrincipal,
    Unknown(String),
}

impl PrincipalKind {
    /// Get the wire representation of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::ServicePrincipal => "ServicePrincipal",
            Self::Unknown(other) => other,
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for PrincipalKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "User" => Self::User,
            "Group" => Self::Group,
            "ServicePrincipal" => Self::ServicePrincipal,
            _ => Self::Unknown(value),
        }
    }
}

impl From<PrincipalKind> for String {
    fn from(value: PrincipalKind) -> Self {
        value.as_str().to_string()
    }
}

/// Managed identity attached to a policy assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentity {
    /// Principal id of the identity.
    pub principal_id: PrincipalId,
}

impl ManagedIdentity {
    /// Create a new managed identity.
    #[must_use]
    pub fn new(principal_id: impl Into<PrincipalId>) -> Self {
        Self {
            principal_id: principal_id.into(),
        }
    }
}
