use fmp_api::{Client, Error, ScreenerQuery};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn client_for(server: &MockServer) -> Client {
    Client::with_base_url(&server.uri(), "test-key").unwrap()
}

#[tokio::test]
async fn get_company_profile_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(query_param("symbol", "AAPL"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("profile_aapl.json")))
        .mount(&mock_server)
        .await;

    let profiles = client_for(&mock_server)
        .get_company_profile("AAPL")
        .await
        .unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].sector.as_deref(), Some("Technology"));
}

#[tokio::test]
async fn get_company_profile_unknown_symbol_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;

    let profiles = client_for(&mock_server)
        .get_company_profile("ZZZZ")
        .await
        .unwrap();
    assert!(profiles.is_empty());
}

#[tokio::test]
async fn get_historical_eod_full_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/historical-price-eod/full"))
        .and(query_param("symbol", "AAPL"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("historical_aapl.json")),
        )
        .mount(&mock_server)
        .await;

    let bars = client_for(&mock_server)
        .get_historical_eod_full("AAPL")
        .await
        .unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[1].close, 228.01);
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/historical-price-eod/full"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"Error Message": "Invalid API KEY. Feel free to create a Free API Key"}"#,
        ))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).get_historical_eod_full("AAPL").await;
    assert!(matches!(result, Err(Error::InvalidApiKey)));
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Limit Reach"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).get_company_profile("AAPL").await;
    assert!(matches!(result, Err(Error::RateLimited)));
}

#[tokio::test]
async fn server_error_carries_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    match client_for(&mock_server).get_company_profile("AAPL").await {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("expected HttpStatus, got {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn error_message_payload_with_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/historical-price-eod/full"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Error Message": "Special Endpoint : this endpoint is not available under your current subscription"}"#,
        ))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).get_historical_eod_full("AAPL").await;
    match result {
        Err(Error::ApiMessage(msg)) => assert!(msg.contains("subscription")),
        other => panic!("expected ApiMessage, got {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn malformed_json_is_parse_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/historical-price-eod/full"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).get_historical_eod_full("AAPL").await;
    assert!(matches!(result, Err(Error::ParseFailed(_))));
}

#[tokio::test]
async fn screener_sends_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/company-screener"))
        .and(query_param("country", "US"))
        .and(query_param("isEtf", "false"))
        .and(query_param("isActivelyTrading", "true"))
        .and(query_param("sector", "Technology"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("screener.json")))
        .mount(&mock_server)
        .await;

    let rows = client_for(&mock_server)
        .get_company_screener(&ScreenerQuery::default().with_sector("Technology"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn connection_refused_is_request_failed() {
    // nothing listens on port 9 on the loopback in CI containers
    let client = Client::with_base_url("http://127.0.0.1:9", "test-key").unwrap();
    let result = client.get_company_profile("AAPL").await;
    assert!(matches!(result, Err(Error::RequestFailed)));
}
