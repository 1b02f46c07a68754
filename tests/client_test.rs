use serde_json::json;
use weblibri_client::{ClientConfig, ClientError, ItemId, LibraryClient, StatusClient};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LibraryClient {
    let config = ClientConfig::new(format!("{}/api", server.uri()), "/library");
    LibraryClient::new(&config).expect("Failed to build client")
}

#[tokio::test]
async fn test_first_check_asks_for_conversion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/42/status.json"))
        .and(query_param_is_missing("enqueue"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"is_ready": false, "uri": "/reader/42"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server)
        .check_status(&ItemId::from(42), true)
        .await
        .expect("check failed");
    assert!(!status.is_ready);
    assert_eq!(status.uri.as_deref(), Some("/reader/42"));
}

#[tokio::test]
async fn test_later_checks_do_not_enqueue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/42/status.json"))
        .and(query_param("enqueue", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_ready": true})))
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server)
        .check_status(&ItemId::from(42), false)
        .await
        .expect("check failed");
    assert!(status.is_ready);
}

#[tokio::test]
async fn test_malformed_status_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/42/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ready": "maybe"})))
        .mount(&server)
        .await;

    let result = client_for(&server).check_status(&ItemId::from(42), true).await;
    assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_server_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/42/status.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client_for(&server).check_status(&ItemId::from(42), false).await;
    match result {
        Err(ClientError::UnexpectedStatus { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/api/42/status.json?enqueue=0"));
        }
        other => panic!("expected an HTTP status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    // Nothing listens on the discard port.
    let config = ClientConfig::new("http://127.0.0.1:9/api", "");
    let client = LibraryClient::new(&config).expect("Failed to build client");
    let error = client
        .check_status(&ItemId::from(1), true)
        .await
        .expect_err("request should fail");
    assert!(error.is_transport());
    assert!(matches!(error, ClientError::TransportError(_)));
}

#[tokio::test]
async fn test_fetch_items_keeps_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "title": "Zorba", "author_sort": "Kazantzakis, Nikos", "available_data": ["EPUB"]},
            {"id": 2, "title": "Anna Karenina", "author_sort": "Tolstoy, Leo", "available_data": ["MOBI", "PDF"]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = client.fetch_items().await.expect("fetch failed");

    let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["9", "2"]);

    let hrefs: Vec<String> = client
        .links()
        .download_links(&items[1])
        .into_iter()
        .map(|link| link.href)
        .collect();
    assert_eq!(hrefs, vec!["/library/data/2/MOBI", "/library/data/2/PDF"]);
}
