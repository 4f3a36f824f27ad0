use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub customer_name: String,
    #[serde(default)]
    pub quantity: u32,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Order>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order).delete(delete_order))
        .route("/echo", post(echo).put(echo).delete(echo))
        .route("/headers", get(headers))
        .route("/problems/{status}", get(problem))
        .route("/errors/text", get(text_error))
        .route("/errors/json", get(json_error))
        .route("/errors/html", get(html_error))
        .route("/slow", get(slow))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_orders(State(db): State<Db>) -> Json<Vec<Order>> {
    let orders = db.read().await;
    Json(orders.values().cloned().collect())
}

async fn create_order(
    State(db): State<Db>,
    Json(input): Json<CreateOrder>,
) -> (StatusCode, Json<Order>) {
    let order = Order {
        id: Uuid::new_v4(),
        customer_name: input.customer_name,
        quantity: input.quantity,
    };
    db.write().await.insert(order.id, order.clone());
    (StatusCode::CREATED, Json(order))
}

async fn get_order(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    match db.read().await.get(&id).cloned() {
        Some(order) => Json(order).into_response(),
        None => not_found(&format!("order {id} does not exist")),
    }
}

async fn delete_order(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    match db.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&format!("order {id} does not exist")),
    }
}

/// Problem document in the shape clients expect.
fn not_found(details: &str) -> Response {
    problem_response(StatusCode::NOT_FOUND, "Not Found", details)
}

fn problem_response(status: StatusCode, title: &str, details: &str) -> Response {
    let body = json!({
        "statusCode": status.as_u16(),
        "title": title,
        "details": details,
    });
    (
        status,
        [(header::CONTENT_TYPE, "application/problem+json")],
        body.to_string(),
    )
        .into_response()
}

async fn echo(body: String) -> Response {
    if body.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn headers(headers: HeaderMap) -> Json<HashMap<String, String>> {
    let map = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    Json(map)
}

async fn problem(Path(status): Path<u16>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let title = status.canonical_reason().unwrap_or("Error");
    problem_response(status, title, &format!("mock problem with status {}", status.as_u16()))
}

async fn text_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn json_error() -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({})))
}

async fn html_error() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/html")],
        "<h1>bad gateway</h1>",
    )
        .into_response()
}

async fn slow() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}
