//! Integration tests for the API clients against a fake backend.
//!
//! These tests verify that:
//! - Login/signup decode success and surface backend error messages
//! - The authenticated client attaches the bearer token (or placeholder)
//! - A 401 clears the session store
//! - Enrollment sends the prior course list plus the new course

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use campus_api::session::{AUTH_KEY, ROLE_KEY};
use campus_api::{
    ClientFactory, Credentials, MemoryStorage, Role, Session, SessionContext, SessionStorage,
    SignupRequest, User, UserInput,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// What the fake backend saw on its last request
#[derive(Default)]
struct Recorder {
    authorization: Mutex<Option<Option<String>>>,
    body: Mutex<Option<(String, Value)>>,
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "a@x.com" && body["password"] == "secret" {
        (
            StatusCode::OK,
            Json(json!({"status": "success", "token": "T1", "role": "admin"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Incorrect email or password"})),
        )
    }
}

async fn signup() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "fail", "message": "Email already in use"})),
    )
}

async fn get_me(State(rec): State<Arc<Recorder>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let auth = auth_header(&headers);
    *rec.authorization.lock() = Some(auth.clone());
    if auth.as_deref() == Some("Bearer T1") {
        (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": {"_id": "u1", "name": "Ann", "email": "ann@x.com", "role": "student", "courses": ["c1"]}
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "You are not logged in"})),
        )
    }
}

async fn list_courses() -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": [
            {"_id": "c1", "title": "Rust", "description": "Ownership", "price": 1500},
            {"_id": "c2", "title": "Go", "description": "Goroutines", "price": 900.5}
        ]
    }))
}

async fn update_user(
    State(rec): State<Arc<Recorder>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    *rec.body.lock() = Some((id, body));
    Json(json!({"status": "success"}))
}

async fn spawn_backend(rec: Arc<Recorder>) -> String {
    let api = Router::new()
        .route("/users/login", post(login))
        .route("/users/signup", post(signup))
        .route("/users/getMe", get(get_me))
        .route("/users/{id}", put(update_user))
        .route("/courses", get(list_courses))
        .with_state(rec);
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/")
}

fn logged_in(storage: &MemoryStorage, token: &str, role: Role) -> SessionContext {
    let ctx = SessionContext::load(storage.clone());
    ctx.set_session(Some(Session {
        token: token.to_string(),
        role,
    }));
    ctx
}

#[tokio::test]
async fn test_login_success() {
    let base = spawn_backend(Arc::default()).await;
    let factory = ClientFactory::new(base.as_str()).unwrap();

    let auth = factory
        .public()
        .login(&Credentials {
            email: "a@x.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();

    assert_eq!(auth.token, "T1");
    assert_eq!(auth.role, Role::Admin);
}

#[tokio::test]
async fn test_signup_failure_carries_backend_message() {
    let base = spawn_backend(Arc::default()).await;
    let factory = ClientFactory::new(base.as_str()).unwrap();

    let err = factory
        .public()
        .signup(&SignupRequest {
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap_err();

    assert!(!err.is_auth_error());
    assert_eq!(err.user_message(), "Email already in use");
}

#[tokio::test]
async fn test_authed_request_attaches_bearer() {
    let rec = Arc::new(Recorder::default());
    let base = spawn_backend(rec.clone()).await;
    let factory = ClientFactory::new(base.as_str()).unwrap();
    let storage = MemoryStorage::new();
    let session = logged_in(&storage, "T1", Role::Student);

    let me: User = factory.authed(&session).get_me().await.unwrap();

    assert_eq!(me.id, "u1");
    assert_eq!(me.courses, vec!["c1"]);
    assert_eq!(
        rec.authorization.lock().clone(),
        Some(Some("Bearer T1".to_string()))
    );
}

#[tokio::test]
async fn test_no_session_sends_placeholder_bearer() {
    let rec = Arc::new(Recorder::default());
    let base = spawn_backend(rec.clone()).await;
    let factory = ClientFactory::new(base.as_str()).unwrap();
    let session = SessionContext::load(MemoryStorage::new());

    let err = factory.authed(&session).get_me().await.unwrap_err();

    assert!(err.is_auth_error());
    assert_eq!(
        rec.authorization.lock().clone(),
        Some(Some("Bearer null".to_string()))
    );
}

#[tokio::test]
async fn test_placeholder_can_be_disabled() {
    let rec = Arc::new(Recorder::default());
    let base = spawn_backend(rec.clone()).await;
    let factory = ClientFactory::builder(base.as_str())
        .send_placeholder_bearer(false)
        .build()
        .unwrap();
    let session = SessionContext::load(MemoryStorage::new());

    let _ = factory.authed(&session).get_me().await;

    assert_eq!(rec.authorization.lock().clone(), Some(None));
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let base = spawn_backend(Arc::default()).await;
    let factory = ClientFactory::new(base.as_str()).unwrap();
    let storage = MemoryStorage::new();
    let session = logged_in(&storage, "expired", Role::Admin);
    assert!(storage.get(AUTH_KEY).is_some());

    let err = factory.authed(&session).get_me().await.unwrap_err();

    assert!(err.is_auth_error());
    assert_eq!(err.user_message(), "You are not logged in");
    assert_eq!(session.get_session(), None);
    assert_eq!(storage.get(AUTH_KEY), None);
    assert_eq!(storage.get(ROLE_KEY), None);
}

#[tokio::test]
async fn test_list_courses_and_enroll() {
    let rec = Arc::new(Recorder::default());
    let base = spawn_backend(rec.clone()).await;
    let factory = ClientFactory::new(base.as_str()).unwrap();
    let storage = MemoryStorage::new();
    let session = logged_in(&storage, "T1", Role::Student);
    let client = factory.authed(&session);

    let courses = client.list_courses().await.unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[1].price, 900.5);

    let me = client.get_me().await.unwrap();
    assert!(!me.is_enrolled("c2"));
    client
        .update_user(&me.id, &UserInput::enroll(&me, "c2"))
        .await
        .unwrap();

    let (id, body) = rec.body.lock().clone().unwrap();
    assert_eq!(id, "u1");
    assert_eq!(body, json!({"courses": ["c1", "c2"]}));
}
