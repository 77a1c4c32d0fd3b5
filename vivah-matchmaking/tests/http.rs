mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use vivah_matchmaking::repository::memory::InMemoryStore;
use vivah_matchmaking::{router, AppState};
use vivah_shared::middleware::DEFAULT_JWT_SECRET;
use vivah_shared::types::auth::{Claims, UserRole};

use common::{engine, seeded};

fn app(store: &Arc<InMemoryStore>) -> Router {
    router(Arc::new(AppState::new(engine(store))))
}

fn token(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, UserRole::User, 3600);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(DEFAULT_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn call(app: &Router, method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        req = req.header("Authorization", format!("Bearer {}", token(user)));
    }
    let req = match body {
        Some(body) => req
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let (store, _) = seeded(&[]);
    let (status, body) = call(&app(&store), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "vivah-matchmaking");
}

#[tokio::test]
async fn endpoints_require_a_bearer_token() {
    let (store, _) = seeded(&[]);
    let (status, body) = call(&app(&store), Method::GET, "/recommendations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "E0004");
}

#[tokio::test]
async fn like_like_then_retract_over_http() {
    let (store, p) = seeded(&["Anjali", "Rahul"]);
    let app = app(&store);

    let (status, body) = call(
        &app,
        Method::POST,
        "/actions",
        Some(p[0].user_id),
        Some(json!({"profile_id": p[1].id, "action": "liked"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["is_mutual_match"], false);

    let (_, body) = call(
        &app,
        Method::POST,
        "/actions",
        Some(p[1].user_id),
        Some(json!({"profile_id": p[0].id, "action": "liked"})),
    )
    .await;
    assert_eq!(body["data"]["is_mutual_match"], true);

    let (_, body) = call(&app, Method::GET, "/mutual", Some(p[0].user_id), None).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["profile_id"], p[1].id);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/actions",
        Some(p[0].user_id),
        Some(json!({"profile_id": p[1].id, "action": "passed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_mutual_match"], false);
    assert_eq!(body["data"]["was_mutual_match_broken"], true);

    let (_, body) = call(&app, Method::GET, "/history?status=passed", Some(p[0].user_id), None).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["status"], "passed");
}

#[tokio::test]
async fn invalid_input_is_rejected_with_client_codes() {
    let (store, p) = seeded(&["Anjali", "Rahul"]);
    let app = app(&store);
    let me = Some(p[0].user_id);

    let (status, body) = call(
        &app,
        Method::POST,
        "/actions",
        me,
        Some(json!({"profile_id": 0, "action": "liked"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E0002");
    assert!(body["error"]["details"]["profile_id"].is_array());

    let (status, body) = call(
        &app,
        Method::POST,
        "/actions",
        me,
        Some(json!({"profile_id": p[1].id, "action": "maybe"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E3001");

    let (status, body) = call(
        &app,
        Method::POST,
        "/actions",
        me,
        Some(json!({"profile_id": p[0].id, "action": "liked"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E3002");

    let (status, body) = call(&app, Method::GET, "/history?status=bogus", me, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E3001");

    assert_eq!(store.action_count(), 0);
}

#[tokio::test]
async fn unknown_target_is_404() {
    let (store, p) = seeded(&["Anjali"]);
    let (status, body) = call(
        &app(&store),
        Method::POST,
        "/actions",
        Some(p[0].user_id),
        Some(json!({"profile_id": 4242, "action": "liked"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "E2001");
}

#[tokio::test]
async fn recommendation_paging_is_clamped() {
    let (store, p) = seeded(&["Anjali", "Rahul", "Kiran"]);
    let app = app(&store);

    let (status, body) = call(
        &app,
        Method::GET,
        "/recommendations?limit=500&offset=-4",
        Some(p[0].user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["limit"], 50);
    assert_eq!(pagination["offset"], 0);
    assert_eq!(pagination["total"], 2);
    assert_eq!(pagination["has_more"], false);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let (_, body) = call(&app, Method::GET, "/recommendations", Some(p[0].user_id), None).await;
    assert_eq!(body["data"]["pagination"]["limit"], 10);
    let (_, body) = call(&app, Method::GET, "/history", Some(p[0].user_id), None).await;
    assert_eq!(body["data"]["pagination"]["limit"], 20);
}

#[tokio::test]
async fn offset_past_the_end_is_an_empty_last_page() {
    let (store, p) = seeded(&["Anjali", "Rahul", "Kiran"]);
    let (status, body) = call(
        &app(&store),
        Method::GET,
        "/recommendations?offset=9223372036854775807",
        Some(p[0].user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["offset"], i64::MAX);
    assert_eq!(pagination["total"], 2);
    assert_eq!(pagination["has_more"], false);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_own_profile_is_404() {
    let (store, _) = seeded(&["Anjali"]);
    let (status, body) = call(&app(&store), Method::GET, "/recommendations", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "E2001");
}

#[tokio::test]
async fn recommendation_timeout_is_504() {
    let (store, p) = seeded(&["Anjali", "Rahul"]);
    store.delay_candidates(Some(Duration::from_millis(300)));
    let service = engine(&store).with_recommendation_timeout(Duration::from_millis(20));
    let app = router(Arc::new(AppState::new(service)));

    let (status, body) = call(&app, Method::GET, "/recommendations", Some(p[0].user_id), None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "E0010");
}
