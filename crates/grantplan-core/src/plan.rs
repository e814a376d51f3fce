//! Plan document: the precomputed change set this engine applies.
//!
//! Plans are produced by an external diffing step and stored as JSON. The
//! engine treats a loaded plan as read-only; identity resolution produces
//! resolved copies of addition records rather than writing back into the
//! plan (see [`crate::apply`]).

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PolicyAssignmentId, PrincipalId, PrincipalKind, RoleDefinitionId, Scope};

/// A single role-assignment record in a plan.
///
/// Invariant: an addition with no `principal_id` must carry an
/// `assignment_id`, so the principal can be resolved from the policy
/// assignment's managed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    /// Principal being granted (or stripped of) the role, when known at
    /// plan time.
    #[serde(default)]
    pub principal_id: Option<PrincipalId>,

    /// Kind of principal, when known.
    #[serde(default)]
    pub object_type: Option<PrincipalKind>,

    /// Resource path the binding applies to.
    pub scope: Scope,

    /// Role definition being bound.
    pub role_definition_id: RoleDefinitionId,

    /// Policy assignment that spawned this record. Present only when
    /// `principal_id` was unknown at plan time.
    #[serde(default)]
    pub assignment_id: Option<PolicyAssignmentId>,

    /// Display name of the principal (diagnostic only).
    #[serde(default)]
    pub display_name: String,

    /// Display name of the role (diagnostic only).
    #[serde(default)]
    pub role_display_name: String,
}

/// Additions and removals encoded by a plan, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignmentDelta {
    /// Bindings to create, in order. Later records may depend on identity
    /// cache entries populated by earlier ones.
    #[serde(default)]
    pub added: Vec<AssignmentRecord>,

    /// Bindings to delete, in order.
    #[serde(default)]
    pub removed: Vec<AssignmentRecord>,
}

impl RoleAssignmentDelta {
    /// True when the delta contains no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A precomputed change set for role-assignment bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// When the plan was computed.
    pub created_on: DateTime<Utc>,

    /// The encoded delta.
    pub role_assignments: RoleAssignmentDelta,
}

/// Errors raised while loading a plan document.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Reading the plan file failed.
    #[error("failed to read plan file: {0}")]
    Io(#[from] io::Error),

    /// The plan file is not valid plan JSON.
    #[error("failed to parse plan document: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Plan {
    /// Load a plan from a JSON file.
    ///
    /// A missing file is a valid "nothing to do" state and returns
    /// `Ok(None)`; a present but malformed file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Option<Self>, PlanError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let plan = serde_json::from_str(&contents)?;
        Ok(Some(plan))
    }

    /// Parse a plan from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Parse`] when the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "createdOn": "2024-05-01T12:00:00Z",
        "roleAssignments": {
            "added": [
                {
                    "scope": "/sub/rg1",
                    "roleDefinitionId": "reader-role-id",
                    "assignmentId": "/providers/pa1",
                    "displayName": "deploy identity",
                    "roleDisplayName": "Reader"
                }
            ],
            "removed": []
        }
    }"#;

    #[test]
    fn parses_plan_with_unresolved_addition() {
        let plan = Plan::from_json(SAMPLE).expect("plan parses");
        assert_eq!(plan.role_assignments.added.len(), 1);
        let added = &plan.role_assignments.added[0];
        assert!(added.principal_id.is_none());
        assert_eq!(
            added.assignment_id,
            Some(PolicyAssignmentId::new("/providers/pa1"))
        );
        assert_eq!(added.role_display_name, "Reader");
    }

    #[test]
    fn empty_delta_reports_empty() {
        let delta = RoleAssignmentDelta::default();
        assert!(delta.is_empty());
    }

    #[test]
    fn missing_plan_file_is_not_an_error() {
        let loaded = Plan::load_from_path("/definitely/not/here.json").expect("load");
        assert!(loaded.is_none());
    }
}
