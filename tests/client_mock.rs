//! Web API client tests: headers, error mapping and the 401 retry

mod common;

use common::*;
use dataverse_cli::api::{MAX_ATTEMPTS, QueryParams};
use dataverse_cli::{DataverseClient, DataverseError};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_sends_bearer_and_odata_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("WhoAmI()")))
        .and(header("Authorization", "Bearer abc123"))
        .and(header("Accept", "application/json"))
        .and(header("OData-MaxVersion", "4.0"))
        .and(header("OData-Version", "4.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UserId": "user-guid",
            "BusinessUnitId": "bu-guid",
            "OrganizationId": "org-guid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let result = client.whoami().await.unwrap();

    assert_eq!(result["UserId"], "user-guid");
}

#[tokio::test]
async fn test_query_params_are_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("workflows")))
        .and(query_param("$filter", "category eq 5"))
        .and(query_param("$select", "name,workflowid"))
        .and(query_param("$top", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let params = QueryParams::new()
        .filter_raw("category eq 5")
        .select(&["name", "workflowid"])
        .top(10);

    let result = client.get("workflows", &params).await.unwrap();
    assert_eq!(result, json!({"value": []}));
}

#[tokio::test]
async fn test_page_size_sets_prefer_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("accounts")))
        .and(header("Prefer", "odata.maxpagesize=50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123"))
        .unwrap()
        .with_page_size(50);
    client.get("accounts", &QueryParams::new()).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_retries_once_with_refreshed_token() {
    let server = MockServer::start().await;
    mount_rotating_tokens(&server).await;

    Mock::given(method("GET"))
        .and(path(api_path("accounts")))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("accounts")))
        .and(header("Authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"name": "Contoso"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&service_principal_config(&server)).unwrap();
    let result = client.get("accounts", &QueryParams::new()).await.unwrap();

    assert_eq!(result["value"][0]["name"], "Contoso");
    assert_eq!(client.credentials().cached_token().unwrap().value(), "token-2");
}

#[tokio::test]
async fn test_second_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("accounts")))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .expect(MAX_ATTEMPTS as u64)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let err = client.get("accounts", &QueryParams::new()).await.unwrap_err();

    match &err {
        DataverseError::Authentication(message) => assert!(message.contains("revoked")),
        other => panic!("expected authentication error, got {:?}", other),
    }
}

/// Token endpoint handing out `token-1` first and `token-2` afterwards
async fn mount_rotating_tokens(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("token-1", 3600))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("token-2", 3600))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_post_retry_resends_body() {
    let server = MockServer::start().await;
    mount_rotating_tokens(&server).await;
    let record = json!({"name": "Sync accounts", "category": 5});

    Mock::given(method("POST"))
        .and(path(api_path("workflows")))
        .and(header("Authorization", "Bearer token-1"))
        .and(body_json(&record))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("workflows")))
        .and(header("Authorization", "Bearer token-2"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(&record))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "workflowid": "29e2253b-cabc-f011-bbd3-000d3a8ba54e"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&service_principal_config(&server)).unwrap();
    let result = client.post("workflows", &record).await.unwrap();

    assert_eq!(result["workflowid"], "29e2253b-cabc-f011-bbd3-000d3a8ba54e");
}

#[tokio::test]
async fn test_delete_second_unauthorized_exchanges_twice() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "sp-token", 3600, MAX_ATTEMPTS as u64).await;

    Mock::given(method("DELETE"))
        .and(path(api_path("workflows(abc)")))
        .and(header("Authorization", "Bearer sp-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("no"))
        .expect(MAX_ATTEMPTS as u64)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&service_principal_config(&server)).unwrap();
    let err = client.delete("workflows(abc)").await.unwrap_err();

    match &err {
        DataverseError::Authentication(message) => {
            assert!(message.contains("still unauthorized"), "unexpected message: {}", message)
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_statuses_are_not_retried() {
    for (status, body) in [
        (404, r#"{"error":{"code":"0x80040217","message":"workflow Does Not Exist"}}"#),
        (429, "Rate limit exceeded"),
        (500, "Internal Server Error"),
    ] {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(api_path("workflows(missing)")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
        let err = client
            .get("workflows(missing)", &QueryParams::new())
            .await
            .unwrap_err();

        match err {
            DataverseError::Api { status_code, body: returned } => {
                assert_eq!(status_code, status);
                assert_eq!(returned, body);
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_post_prefers_representation() {
    let server = MockServer::start().await;
    let record = json!({"name": "Sync accounts", "category": 5});

    Mock::given(method("POST"))
        .and(path(api_path("workflows")))
        .and(header("Prefer", "return=representation"))
        .and(header_exists("Content-Type"))
        .and(body_json(&record))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "workflowid": "29e2253b-cabc-f011-bbd3-000d3a8ba54e",
            "name": "Sync accounts"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let result = client.post("workflows", &record).await.unwrap();

    assert_eq!(result["workflowid"], "29e2253b-cabc-f011-bbd3-000d3a8ba54e");
}

#[tokio::test]
async fn test_post_no_content_reads_entity_id() {
    let server = MockServer::start().await;
    let entity_url = format!(
        "{}{}",
        server.uri(),
        api_path("workflows(29e2253b-cabc-f011-bbd3-000d3a8ba54e)")
    );

    Mock::given(method("POST"))
        .and(path(api_path("workflows")))
        .respond_with(ResponseTemplate::new(204).insert_header("OData-EntityId", entity_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let result = client.post("workflows", &json!({"name": "x"})).await.unwrap();

    assert_eq!(result, json!({"id": "29e2253b-cabc-f011-bbd3-000d3a8ba54e"}));
}

#[tokio::test]
async fn test_patch_empty_body_is_empty_object() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(api_path("workflows(abc)")))
        .and(body_json(json!({"statecode": 1})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let result = client
        .patch("workflows(abc)", &json!({"statecode": 1}))
        .await
        .unwrap();

    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn test_delete() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("connectors(abc)")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    client.delete("connectors(abc)").await.unwrap();
}

#[tokio::test]
async fn test_malformed_json_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("accounts")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let mut client = DataverseClient::new(&token_config(&server, "abc123")).unwrap();
    let err = client.get("accounts", &QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, DataverseError::InvalidResponse(_)));
    assert_eq!(err.exit_code(), 1);
}
