//! Integration tests for the GitHub dispatch client against a mock API.

use error_webhook::{
    Dispatch, DispatchError, GitHubConfig, GitHubDispatcher, Provider, ProviderPayload,
};
use serde_json::json;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

fn github_config(server: &MockServer) -> GitHubConfig {
    GitHubConfig {
        token: Some("ghp_test".to_string()),
        owner: Some("acme".to_string()),
        repo: Some("api".to_string()),
        api_url: server.uri(),
    }
}

fn betterstack_record() -> error_webhook::ErrorRecord {
    let body = json!({
        "data": {
            "id": "inc-204",
            "attributes": {
                "name": "ZeroDivisionError in flexy",
                "cause": "**ZeroDivisionError**\n```\ndivision by zero\n```\n`app/calc.py` in `divide`",
                "url": "https://uptime.betterstack.com/team/1/incidents/204"
            }
        }
    });
    ProviderPayload::parse(Provider::BetterStack, body.to_string().as_bytes())
        .unwrap()
        .normalize()
}

#[tokio::test]
async fn test_dispatch_sends_repository_dispatch() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/repos/acme/api/dispatches"))
        .and(matchers::header("authorization", "Bearer ghp_test"))
        .and(matchers::header("accept", "application/vnd.github.v3+json"))
        .and(matchers::header("user-agent", "error-webhook-dispatcher"))
        .and(matchers::body_partial_json(json!({
            "event_type": "error_investigation",
            "client_payload": {
                "source": "betterstack",
                "error": {
                    "errorId": "inc-204",
                    "title": "ZeroDivisionError in flexy",
                    "errorType": "ZeroDivisionError",
                    "platform": "python",
                    "incidentUrl": "https://uptime.betterstack.com/team/1/incidents/204"
                }
            }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = GitHubDispatcher::new(&github_config(&server)).unwrap();
    let outcome = dispatcher
        .dispatch(&betterstack_record(), Provider::BetterStack)
        .await
        .unwrap();

    assert_eq!(outcome.status_code, 204);
    assert_eq!(outcome.repo, "acme/api");
}

#[tokio::test]
async fn test_dispatch_envelope_has_timestamp() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let dispatcher = GitHubDispatcher::new(&github_config(&server)).unwrap();
    dispatcher
        .dispatch(&betterstack_record(), Provider::BetterStack)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let timestamp = sent["client_payload"]["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_dispatch_captures_error_body() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/repos/acme/api/dispatches"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"message":"Validation Failed"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = GitHubDispatcher::new(&github_config(&server)).unwrap();
    let err = dispatcher
        .dispatch(&betterstack_record(), Provider::BetterStack)
        .await
        .unwrap_err();

    match &err {
        DispatchError::Api { status, body } => {
            assert_eq!(*status, 422);
            assert!(body.contains("Validation Failed"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert!(err.to_string().contains("422"));
}

#[tokio::test]
async fn test_missing_config_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = GitHubDispatcher::new(&GitHubConfig {
        owner: None,
        ..github_config(&server)
    })
    .unwrap_err();

    assert!(err.to_string().contains("GITHUB_REPO_OWNER"));
}
