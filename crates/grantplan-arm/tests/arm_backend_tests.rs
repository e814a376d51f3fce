//! ARM backend tests against a fake management endpoint.

use grantplan_core::{
    AuthorizationBackend, BackendError, BindingRequest, PolicyAssignmentId, PrincipalId,
    PrincipalKind, RoleDefinitionId, Scope,
};
use grantplan_arm::ArmClient;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> ArmClient {
    ArmClient::new(&server.uri(), "test-token").expect("valid base url")
}

#[tokio::test]
async fn lookup_extracts_managed_identity_principal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/providers/pa1"))
        .and(query_param("api-version", grantplan_arm::POLICY_API_VERSION))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "/providers/pa1",
            "identity": { "type": "SystemAssigned", "principalId": "p-123" }
        })))
        .mount(&server)
        .await;

    let identity = client(&server)
        .await
        .lookup_assignment_identity(&PolicyAssignmentId::new("/providers/pa1"))
        .await
        .expect("lookup succeeds")
        .expect("identity present");
    assert_eq!(identity.principal_id, PrincipalId::new("p-123"));
}

#[tokio::test]
async fn lookup_without_identity_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/providers/pa2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "/providers/pa2"
        })))
        .mount(&server)
        .await;

    let identity = client(&server)
        .await
        .lookup_assignment_identity(&PolicyAssignmentId::new("/providers/pa2"))
        .await
        .expect("lookup succeeds");
    assert!(identity.is_none());
}

#[tokio::test]
async fn existence_check_matches_role_definition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/sub/rg1/providers/Microsoft.Authorization/roleAssignments",
        ))
        .and(query_param("$filter", "principalId eq 'p-123'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": "/sub/rg1/providers/Microsoft.Authorization/roleAssignments/ra1",
                "properties": {
                    "principalId": "p-123",
                    "roleDefinitionId": "/providers/Microsoft.Authorization/roleDefinitions/reader"
                }
            }]
        })))
        .mount(&server)
        .await;

    let backend = client(&server).await;
    let exists = backend
        .binding_exists(
            &Scope::new("/sub/rg1"),
            &PrincipalId::new("p-123"),
            &RoleDefinitionId::new("reader"),
        )
        .await
        .expect("query succeeds");
    assert!(exists);

    let exists = backend
        .binding_exists(
            &Scope::new("/sub/rg1"),
            &PrincipalId::new("p-123"),
            &RoleDefinitionId::new("owner"),
        )
        .await
        .expect("query succeeds");
    assert!(!exists);
}

#[tokio::test]
async fn empty_result_set_means_does_not_exist() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/sub/rg1/providers/Microsoft.Authorization/roleAssignments",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let exists = client(&server)
        .await
        .binding_exists(
            &Scope::new("/sub/rg1"),
            &PrincipalId::new("p-123"),
            &RoleDefinitionId::new("reader"),
        )
        .await
        .expect("query succeeds");
    assert!(!exists);
}

#[tokio::test]
async fn create_puts_binding_with_principal_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(body_partial_json(json!({
            "properties": {
                "principalId": "p-123",
                "principalType": "ServicePrincipal",
                "roleDefinitionId": "reader"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "/sub/rg1/providers/Microsoft.Authorization/roleAssignments/ra-new",
            "properties": { "principalId": "p-123", "roleDefinitionId": "reader" }
        })))
        .mount(&server)
        .await;

    let created = client(&server)
        .await
        .create_binding(&BindingRequest {
            principal_id: PrincipalId::new("p-123"),
            object_type: Some(PrincipalKind::ServicePrincipal),
            scope: Scope::new("/sub/rg1"),
            role_definition_id: RoleDefinitionId::new("reader"),
        })
        .await
        .expect("create succeeds")
        .expect("binding returned");
    assert_eq!(
        created.id,
        "/sub/rg1/providers/Microsoft.Authorization/roleAssignments/ra-new"
    );
}

#[tokio::test]
async fn create_surfaces_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_string("PrincipalNotFound"))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .create_binding(&BindingRequest {
            principal_id: PrincipalId::new("p-123"),
            object_type: None,
            scope: Scope::new("/sub/rg1"),
            role_definition_id: RoleDefinitionId::new("reader"),
        })
        .await
        .expect_err("create fails");
    assert!(
        matches!(err, BackendError::Status { status: 400, .. }),
        "expected status error, got {err:?}"
    );
}

#[tokio::test]
async fn delete_addresses_the_matching_assignment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/sub/rg1/providers/Microsoft.Authorization/roleAssignments",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": "/sub/rg1/providers/Microsoft.Authorization/roleAssignments/ra1",
                "properties": { "principalId": "p-123", "roleDefinitionId": "reader" }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(
            "/sub/rg1/providers/Microsoft.Authorization/roleAssignments/ra1",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .await
        .delete_binding(
            &Scope::new("/sub/rg1"),
            &PrincipalId::new("p-123"),
            &RoleDefinitionId::new("reader"),
        )
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn delete_of_absent_binding_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .delete_binding(
            &Scope::new("/sub/rg1"),
            &PrincipalId::new("p-123"),
            &RoleDefinitionId::new("reader"),
        )
        .await
        .expect_err("delete fails");
    assert!(
        matches!(err, BackendError::NotFound { .. }),
        "expected not found, got {err:?}"
    );
}
