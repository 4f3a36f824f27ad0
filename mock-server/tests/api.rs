use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Order};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn content_type(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// --- orders ---

#[tokio::test]
async fn create_order_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/orders", r#"{"customerName":"Ada","quantity":3}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Order = body_json(resp).await;
    assert_eq!(order.customer_name, "Ada");
    assert_eq!(order.quantity, 3);
}

#[tokio::test]
async fn missing_order_is_a_problem_document() {
    let resp = app()
        .oneshot(get("/orders/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&resp), "application/problem+json");
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["title"], "Not Found");
}

// --- echo ---

#[tokio::test]
async fn echo_returns_body_unchanged() {
    let payload = r#"{"nested":{"a":[1,2,3]},"name":"x"}"#;
    let resp = app().oneshot(json_request("PUT", "/echo", payload)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");
    assert_eq!(body_bytes(resp).await, payload.as_bytes());
}

#[tokio::test]
async fn echo_without_body_is_no_content() {
    let resp = app().oneshot(json_request("POST", "/echo", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// --- headers ---

#[tokio::test]
async fn headers_are_reflected() {
    let req = Request::builder()
        .uri("/headers")
        .header("x-tenant", "blue")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    let headers: std::collections::HashMap<String, String> = body_json(resp).await;
    assert_eq!(headers["x-tenant"], "blue");
}

// --- error shapes ---

#[tokio::test]
async fn problem_route_uses_requested_status() {
    let resp = app().oneshot(get("/problems/409")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["title"], "Conflict");
    assert_eq!(body["details"], "mock problem with status 409");
}

#[tokio::test]
async fn text_error_is_plain_text() {
    let resp = app().oneshot(get("/errors/text")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type(&resp).starts_with("text/plain"));
    assert_eq!(body_bytes(resp).await, "boom");
}

#[tokio::test]
async fn json_error_is_empty_object() {
    let resp = app().oneshot(get("/errors/json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, "{}");
}

#[tokio::test]
async fn html_error_is_html() {
    let resp = app().oneshot(get("/errors/html")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(content_type(&resp), "text/html");
}

// --- full lifecycle ---

#[tokio::test]
async fn order_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/orders", r#"{"customerName":"Grace"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Order = body_json(resp).await;
    let id = created.id;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/orders/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Order = body_json(resp).await;
    assert_eq!(fetched.customer_name, "Grace");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&format!("/orders/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/orders"))
        .await
        .unwrap();
    let orders: Vec<Order> = body_json(resp).await;
    assert!(orders.is_empty());
}
