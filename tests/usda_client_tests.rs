use food_match::api_connection::{CatalogClient, CatalogError, SearchRequest, UsdaClient};
use food_match::config::MatcherConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server_url: &str, max_retries: u32) -> MatcherConfig {
    MatcherConfig {
        api_key: Some("test_key".to_string()),
        base_url: server_url.to_string(),
        max_retries,
        retry_base_delay: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        ..MatcherConfig::default()
    }
}

fn search_request(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        branded_only: None,
        page_size: 10,
    }
}

#[tokio::test]
async fn test_search_parses_foods() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/foods/search"))
        .and(query_param("api_key", "test_key"))
        .and(body_partial_json(json!({"query": "avocado", "pageSize": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalHits": 2,
            "foods": [
                {"fdcId": 171705, "description": "Avocados, raw, all commercial varieties", "dataType": "SR Legacy"},
                {"fdcId": 2000001, "description": "AVOCADO", "brandOwner": "Fresh Farms", "dataType": "Branded", "gtinUpc": "000"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = UsdaClient::new(&test_config(&mock_server.uri(), 0)).unwrap();
    let hits = client.search(&search_request("avocado")).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "171705");
    assert_eq!(hits[1].brand_owner.as_deref(), Some("Fresh Farms"));
}

#[tokio::test]
async fn test_fetch_nutrients_parses_and_skips_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/food/171705"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fdcId": 171705,
            "foodNutrients": [
                {"nutrient": {"id": 1003, "number": "203", "name": "Protein", "unitName": "g"}, "amount": 2.0},
                {"nutrient": {"id": 1008, "number": "208", "name": "Energy", "unitName": "kcal"}, "amount": 160.0},
                {"nutrient": {"id": 951, "name": "Proximates", "unitName": "g"}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = UsdaClient::new(&test_config(&mock_server.uri(), 0)).unwrap();
    let records = client.fetch_nutrients("171705").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].nutrient_id, 1008);
    assert_eq!(records[1].amount, 160.0);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/food/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = UsdaClient::new(&test_config(&mock_server.uri(), 3)).unwrap();
    let err = client.fetch_nutrients("1").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref id) if id == "1"));
}

#[tokio::test]
async fn test_server_errors_are_retried_then_surfaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = UsdaClient::new(&test_config(&mock_server.uri(), 2)).unwrap();
    let err = client.search(&search_request("avocado")).await.unwrap_err();
    match err {
        CatalogError::ApiError { status, error_body } => {
            assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(error_body, "busy");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = UsdaClient::new(&test_config(&mock_server.uri(), 3)).unwrap();
    let err = client.search(&search_request("avocado")).await.unwrap_err();
    assert!(matches!(err, CatalogError::ApiError { status, .. } if status == reqwest::StatusCode::FORBIDDEN));
}

#[tokio::test]
async fn test_malformed_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalHits": 0})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/food/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = UsdaClient::new(&test_config(&mock_server.uri(), 0)).unwrap();
    assert!(matches!(
        client.search(&search_request("avocado")).await,
        Err(CatalogError::MalformedResponse(_))
    ));
    assert!(matches!(client.fetch_nutrients("5").await, Err(CatalogError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_timeouts_are_retried_then_surfaced_as_network_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri(), 1);
    config.request_timeout = Duration::from_millis(100);
    let client = UsdaClient::new(&config).unwrap();
    let err = client.search(&search_request("avocado")).await.unwrap_err();
    assert!(matches!(err, CatalogError::NetworkError { attempts: 2, .. }));
}
