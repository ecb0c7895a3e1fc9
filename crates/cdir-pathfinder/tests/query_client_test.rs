//! Contract tests for HttpQueryClient.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/records/{digits}` | `query_*` |

use cdir_core::PhoneNumber;
use cdir_pathfinder::{PathfinderClient, PathfinderConfig, PathfinderError, RoutingQuery};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> PathfinderClient {
    let config = PathfinderConfig {
        query_url: mock_server.uri().parse().unwrap(),
        provisioning_url: "http://127.0.0.1:19001".parse().unwrap(),
        timeout_ms: 2000,
    };
    PathfinderClient::new(config).unwrap()
}

fn phone() -> PhoneNumber {
    PhoneNumber::new("+14441235555").unwrap()
}

#[tokio::test]
async fn query_uses_digits_and_parses_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/14441235555"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": [
                {
                    "order": 10,
                    "preference": 1,
                    "service": "E2U+pstn:tel",
                    "partnerId": "10305",
                    "regexp": { "pattern": "^.*$", "replace": "mm:001.002@mojaloop.org" }
                },
                {
                    "order": 20,
                    "preference": 2,
                    "service": "E2U+sip",
                    "partnerId": "10305",
                    "regexp": { "pattern": "^.*$", "replace": "sip:x@example.org" }
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client.query().request(&phone()).await.unwrap();
    assert_eq!(response.records.len(), 2);
    assert_eq!(response.records[0].partner_id, "10305");
    assert_eq!(response.records[0].regexp.replace, "mm:001.002@mojaloop.org");
    assert_eq!(response.records[1].order, 20);
}

#[tokio::test]
async fn query_404_is_empty_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/14441235555"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client.query().request(&phone()).await.unwrap();
    assert!(response.records.is_empty());
}

#[tokio::test]
async fn query_500_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/14441235555"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    match client.query().request(&phone()).await.unwrap_err() {
        PathfinderError::ApiError { status, body, endpoint } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
            assert_eq!(endpoint, "GET /records/14441235555");
        }
        other => panic!("expected ApiError, got: {other:?}"),
    }
}

#[tokio::test]
async fn query_malformed_body_is_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records/14441235555"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.query().request(&phone()).await.unwrap_err();
    assert!(matches!(err, PathfinderError::Deserialization { .. }));
}

#[tokio::test]
async fn query_unreachable_is_http_error() {
    let config = PathfinderConfig::local_mock(1, 2).unwrap();
    let client = PathfinderClient::new(config).unwrap();
    let err = client.query().request(&phone()).await.unwrap_err();
    assert!(matches!(err, PathfinderError::Http { .. }));
}
