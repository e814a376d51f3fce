//! HTTP client for the `Microsoft.Authorization` role-assignment surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use grantplan_core::{
    AuthorizationBackend, BackendError, BackendResult, BindingRequest, CreatedBinding,
    ManagedIdentity, PolicyAssignmentId, PrincipalId, RoleDefinitionId, Scope,
};

use crate::environment::CloudEnvironment;

/// API version for role-assignment operations.
pub const ROLE_ASSIGNMENT_API_VERSION: &str = "2022-04-01";

/// API version for policy-assignment reads.
pub const POLICY_API_VERSION: &str = "2023-04-01";

/// Authorization backend over an ARM-style management endpoint.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    /// Base endpoint, no trailing slash.
    base: String,
    token: String,
}

impl ArmClient {
    /// Create a client against an explicit management endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `base_url` is not a valid URL.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create a client for a sovereign cloud environment.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when the environment endpoint cannot be
    /// parsed (not expected for the built-in environments).
    pub fn for_environment(
        environment: CloudEnvironment,
        token: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Self::new(environment.management_endpoint(), token)
    }

    fn assignments_url(&self, scope: &Scope) -> String {
        format!(
            "{}{}/providers/Microsoft.Authorization/roleAssignments",
            self.base,
            scope.as_str()
        )
    }

    /// List role assignments at a scope, filtered to one principal.
    async fn list_bindings(
        &self,
        scope: &Scope,
        principal_id: &PrincipalId,
    ) -> BackendResult<Vec<RoleAssignment>> {
        const OP: &str = "list role assignments";

        let filter = format!("principalId eq '{}'", principal_id.as_str());
        let response = self
            .http
            .get(self.assignments_url(scope))
            .bearer_auth(&self.token)
            .query(&[
                ("api-version", ROLE_ASSIGNMENT_API_VERSION),
                ("$filter", filter.as_str()),
            ])
            .send()
            .await
            .map_err(|err| transport(OP, &err))?;

        let response = check_status(OP, response).await?;
        let list: RoleAssignmentList = response
            .json()
            .await
            .map_err(|err| decode(OP, &err))?;
        Ok(list.value)
    }
}

#[async_trait]
impl AuthorizationBackend for ArmClient {
    async fn lookup_assignment_identity(
        &self,
        assignment_id: &PolicyAssignmentId,
    ) -> BackendResult<Option<ManagedIdentity>> {
        const OP: &str = "get policy assignment";

        let response = self
            .http
            .get(format!("{}{}", self.base, assignment_id.as_str()))
            .bearer_auth(&self.token)
            .query(&[("api-version", POLICY_API_VERSION)])
            .send()
            .await
            .map_err(|err| transport(OP, &err))?;

        let response = check_status(OP, response).await?;
        let assignment: PolicyAssignmentResponse = response
            .json()
            .await
            .map_err(|err| decode(OP, &err))?;

        Ok(assignment
            .identity
            .and_then(|identity| identity.principal_id)
            .map(ManagedIdentity::new))
    }

    async fn binding_exists(
        &self,
        scope: &Scope,
        principal_id: &PrincipalId,
        role_definition_id: &RoleDefinitionId,
    ) -> BackendResult<bool> {
        let bindings = self.list_bindings(scope, principal_id).await?;
        Ok(bindings
            .iter()
            .any(|binding| role_matches(&binding.properties.role_definition_id, role_definition_id)))
    }

    async fn create_binding(
        &self,
        request: &BindingRequest,
    ) -> BackendResult<Option<CreatedBinding>> {
        const OP: &str = "create role assignment";

        let name = Uuid::new_v4();
        let url = format!("{}/{name}", self.assignments_url(&request.scope));
        debug!(url = %url, principal = %request.principal_id, "creating role assignment");

        let body = CreateRoleAssignment {
            properties: CreateRoleAssignmentProperties {
                principal_id: request.principal_id.as_str(),
                principal_type: request.object_type.as_ref().map(|kind| kind.as_str()),
                role_definition_id: request.role_definition_id.as_str(),
            },
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .query(&[("api-version", ROLE_ASSIGNMENT_API_VERSION)])
            .json(&body)
            .send()
            .await
            .map_err(|err| transport(OP, &err))?;

        let response = check_status(OP, response).await?;
        let created: CreatedRoleAssignment = response
            .json()
            .await
            .map_err(|err| decode(OP, &err))?;
        Ok(Some(CreatedBinding { id: created.id }))
    }

    async fn delete_binding(
        &self,
        scope: &Scope,
        principal_id: &PrincipalId,
        role_definition_id: &RoleDefinitionId,
    ) -> BackendResult<()> {
        const OP: &str = "delete role assignment";

        let bindings = self.list_bindings(scope, principal_id).await?;
        let Some(binding) = bindings
            .iter()
            .find(|binding| role_matches(&binding.properties.role_definition_id, role_definition_id))
        else {
            return Err(BackendError::NotFound {
                principal_id: principal_id.clone(),
                scope: scope.clone(),
            });
        };

        let response = self
            .http
            .delete(format!("{}{}", self.base, binding.id))
            .bearer_auth(&self.token)
            .query(&[("api-version", ROLE_ASSIGNMENT_API_VERSION)])
            .send()
            .await
            .map_err(|err| transport(OP, &err))?;

        check_status(OP, response).await?;
        Ok(())
    }
}

/// Match a fully qualified role definition id against a plan value, which
/// may itself be fully qualified or a bare definition name.
fn role_matches(listed: &str, wanted: &RoleDefinitionId) -> bool {
    let wanted = wanted.as_str();
    listed == wanted
        || listed.ends_with(&format!("/{wanted}"))
        || wanted.ends_with(&format!("/{listed}"))
}

fn transport(operation: &'static str, err: &reqwest::Error) -> BackendError {
    BackendError::Transport {
        operation,
        message: err.to_string(),
    }
}

fn decode(operation: &'static str, err: &reqwest::Error) -> BackendError {
    BackendError::Decode {
        operation,
        message: err.to_string(),
    }
}

async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

// ── Wire shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PolicyAssignmentResponse {
    #[serde(default)]
    identity: Option<PolicyAssignmentIdentity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyAssignmentIdentity {
    #[serde(default)]
    principal_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleAssignmentList {
    #[serde(default)]
    value: Vec<RoleAssignment>,
}

#[derive(Debug, Deserialize)]
struct RoleAssignment {
    id: String,
    properties: RoleAssignmentProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleAssignmentProperties {
    #[allow(dead_code)]
    principal_id: String,
    role_definition_id: String,
}

#[derive(Debug, Serialize)]
struct CreateRoleAssignment<'a> {
    properties: CreateRoleAssignmentProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoleAssignmentProperties<'a> {
    principal_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    principal_type: Option<&'a str>,
    role_definition_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedRoleAssignment {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_matching_tolerates_qualification_differences() {
        let full = "/subscriptions/s1/providers/Microsoft.Authorization/roleDefinitions/abc";
        assert!(role_matches(full, &RoleDefinitionId::new(full)));
        assert!(role_matches(full, &RoleDefinitionId::new("abc")));
        assert!(!role_matches(full, &RoleDefinitionId::new("def")));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ArmClient::new("https://management.azure.com/", "tok").expect("url");
        assert_eq!(
            client.assignments_url(&Scope::new("/sub/rg1")),
            "https://management.azure.com/sub/rg1/providers/Microsoft.Authorization/roleAssignments"
        );
    }
}
