use recipe_fetch::client::{FetchError, RecipeClient};
use recipe_fetch::config::Remote;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote(endpoint: String) -> Remote {
    Remote {
        endpoint: Some(endpoint),
        timeout_seconds: 1,
        allow_redirect_status: false,
        user_agent: None,
    }
}

async fn serve(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes.json"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer) -> RecipeClient {
    RecipeClient::from_config(&remote(format!("{}/recipes.json", server.uri()))).unwrap()
}

#[tokio::test]
async fn decodes_catalog_on_success() {
    let body = json!({ "recipes": [
        { "cuisine": "Malaysian", "name": "Apam Balik", "uuid": "a",
          "photo_url_large": "https://cdn/l.jpg", "photo_url_small": "https://cdn/s.jpg",
          "source_url": "https://example.com/apam", "youtube_url": "https://youtube.com/x" },
        { "cuisine": "British", "name": "Bakewell Tart", "uuid": "b" },
        { "cuisine": "British", "name": "Battenberg Cake", "uuid": "c", "source_url": "" }
    ]});
    let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;

    let recipes = client_for(&server).fetch_catalog().await.unwrap();
    let ids: Vec<_> = recipes.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(recipes[1].youtube_url, None);
    assert_eq!(recipes[2].source_url.as_deref(), Some(""));
}

#[tokio::test]
async fn no_content_is_an_empty_catalog() {
    let server = serve(ResponseTemplate::new(204)).await;
    assert_eq!(client_for(&server).fetch_catalog().await, Ok(Vec::new()));
}

#[tokio::test]
async fn empty_ok_body_is_a_decode_failure() {
    let server = serve(ResponseTemplate::new(200).set_body_string("")).await;
    let err = client_for(&server).fetch_catalog().await.unwrap_err();
    assert!(matches!(err, FetchError::DecodeFailed(_)), "got {err:?}");

    let server = serve(ResponseTemplate::new(200).set_body_string("  \n")).await;
    let err = client_for(&server).fetch_catalog().await.unwrap_err();
    assert!(matches!(err, FetchError::DecodeFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn classifies_error_statuses() {
    let server = serve(ResponseTemplate::new(404)).await;
    assert_eq!(
        client_for(&server).fetch_catalog().await,
        Err(FetchError::ClientError(404))
    );

    let server = serve(ResponseTemplate::new(503).set_body_string("maintenance")).await;
    assert_eq!(
        client_for(&server).fetch_catalog().await,
        Err(FetchError::ServerError(503))
    );
}

#[tokio::test]
async fn redirect_status_passes_through_only_when_allowed() {
    // No Location header, so the response reaches the client as-is.
    let body = json!({ "recipes": [{ "cuisine": "Greek", "name": "Baklava", "uuid": "g" }] });
    let server = serve(ResponseTemplate::new(300).set_body_json(body)).await;
    let endpoint = format!("{}/recipes.json", server.uri());

    let strict = RecipeClient::from_config(&remote(endpoint.clone())).unwrap();
    assert_eq!(strict.fetch_catalog().await, Err(FetchError::UnknownStatus(300)));

    let mut cfg = remote(endpoint);
    cfg.allow_redirect_status = true;
    let lenient = RecipeClient::from_config(&cfg).unwrap();
    assert_eq!(lenient.fetch_catalog().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = serve(ResponseTemplate::new(200).set_body_string("{\"recipes\": [{\"name\": 1}")).await;
    let err = client_for(&server).fetch_catalog().await.unwrap_err();
    assert!(matches!(err, FetchError::DecodeFailed(_)), "got {err:?}");

    let body = json!({ "recipes": [{ "cuisine": "Greek", "name": "Baklava" }] });
    let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;
    match client_for(&server).fetch_catalog().await {
        Err(FetchError::DecodeFailed(cause)) => assert!(cause.contains("uuid"), "cause: {cause}"),
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_is_a_transport_timeout() {
    let server = serve(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "recipes": [] }))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    assert_eq!(
        client_for(&server).fetch_catalog().await,
        Err(FetchError::Transport("timeout".into()))
    );
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client =
        RecipeClient::from_config(&remote(format!("http://127.0.0.1:{port}/recipes.json"))).unwrap();
    match client.fetch_catalog().await {
        Err(FetchError::Transport(cause)) => assert!(cause.starts_with("connect"), "cause: {cause}"),
        other => panic!("unexpected result {other:?}"),
    }
}
