//! End-to-end checks of the HTTP clients, session store and view-model
//! against an in-process stub of the conversation backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use convo_desk::config::Timeouts;
use convo_desk::error::{ApiError, AuthError};
use convo_desk::net::api::{HttpAuthClient, HttpConversationRepository};
use convo_desk::net::repository::{AuthBackend, ConversationRepository};
use convo_desk::net::types::{Category, ConversationDraft, ListFilter, LoginRequest, Role, SignupRequest};
use convo_desk::state::conversations::{ConversationViewModel, PagingMode, RemoveOutcome};
use convo_desk::state::session::{FileStorage, SessionStore};

// =============================================================================
// STUB BACKEND
// =============================================================================

#[derive(Default)]
struct Stub {
    rows: Vec<Value>,
    next_id: i64,
    authorization: Vec<String>,
}

type Shared = Arc<Mutex<Stub>>;

fn record_auth(state: &Shared, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.lock().unwrap().authorization.push(value.to_owned());
    }
}

fn category_of(row: &Value) -> &str {
    row.get("category").and_then(Value::as_str).unwrap_or("")
}

fn spring_page(rows: Vec<Value>, params: &HashMap<String, String>) -> Value {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: usize = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(5);
    let total = rows.len();
    let content: Vec<Value> = rows.into_iter().skip(page * size).take(size).collect();
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": total.div_ceil(size),
        "number": page,
        "size": size,
    })
}

async fn add(State(state): State<Shared>, headers: HeaderMap, Json(mut body): Json<Value>) -> Json<Value> {
    record_auth(&state, &headers);
    let mut stub = state.lock().unwrap();
    stub.next_id += 1;
    body["id"] = json!(stub.next_id);
    stub.rows.push(body.clone());
    Json(body)
}

async fn all(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record_auth(&state, &headers);
    Json(Value::Array(state.lock().unwrap().rows.clone()))
}

async fn by_category(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let wanted = params.get("category").cloned().unwrap_or_default();
    let rows = state.lock().unwrap().rows.iter().filter(|r| category_of(r) == wanted).cloned().collect();
    Json(Value::Array(rows))
}

async fn sorted(State(state): State<Shared>) -> Json<Value> {
    let mut rows = state.lock().unwrap().rows.clone();
    rows.reverse();
    Json(Value::Array(rows))
}

async fn update(State(state): State<Shared>, Path(id): Path<i64>, Json(mut body): Json<Value>) -> Response {
    let mut stub = state.lock().unwrap();
    match stub.rows.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(row) => {
            body["id"] = json!(id);
            *row = body.clone();
            Json(body).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Conversation not found" }))).into_response(),
    }
}

async fn remove(State(state): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    let mut stub = state.lock().unwrap();
    let before = stub.rows.len();
    stub.rows.retain(|r| r["id"] != json!(id));
    if stub.rows.len() < before { StatusCode::OK } else { StatusCode::NOT_FOUND }
}

async fn paged(State(state): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let rows = state.lock().unwrap().rows.clone();
    Json(spring_page(rows, &params))
}

async fn paged_by_category(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let wanted = params.get("category").cloned().unwrap_or_default();
    let rows = state.lock().unwrap().rows.iter().filter(|r| category_of(r) == wanted).cloned().collect();
    Json(spring_page(rows, &params))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != json!("secret1") {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    }
    Json(json!({
        "token": "tok-123",
        "username": body["username"],
        "email": "ada@example.com",
        "role": "ROLE_RESEARCHER",
    }))
    .into_response()
}

async fn signup(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "token": "tok-new",
        "username": body["username"],
        "email": body["email"],
        "role": body["role"],
    }))
}

async fn spawn_backend() -> (String, Shared) {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/api/chats/addConversation", post(add))
        .route("/api/chats/allConversations", get(all))
        .route("/api/chats/byCategory", get(by_category))
        .route("/api/chats/sortedByTime", get(sorted))
        .route("/api/chats/updateConversation/{id}", put(update))
        .route("/api/chats/deleteConversation/{id}", delete(remove))
        .route("/api/chats/conversations", get(paged))
        .route("/api/chats/conversationsByCategory", get(paged_by_category))
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/api"), state)
}

fn draft(prompt: &str, category: Category) -> ConversationDraft {
    ConversationDraft {
        prompt: prompt.to_owned(),
        response: format!("answer to {prompt}"),
        category,
        timestamp: Some(time::macros::datetime!(2024-03-05 10:15:30 UTC)),
    }
}

fn chats(base: &str) -> HttpConversationRepository {
    HttpConversationRepository::new(format!("{base}/chats"), Timeouts::default()).unwrap()
}

// =============================================================================
// REPOSITORY
// =============================================================================

#[tokio::test]
async fn repository_crud_round_trip() {
    let (base, state) = spawn_backend().await;
    let repo = chats(&base).with_token("tok-123");

    let created = repo.create(&draft("first", Category::Coding)).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.category, Category::Coding);
    assert_eq!(created.timestamp, Some(time::macros::datetime!(2024-03-05 10:15:30 UTC)));

    repo.create(&draft("second", Category::Career)).await.unwrap();
    assert_eq!(repo.fetch_all().await.unwrap().len(), 2);

    let coding = repo.fetch_by_category(&Category::Coding).await.unwrap();
    assert_eq!(coding.len(), 1);
    assert_eq!(coding[0].prompt, "first");

    let sorted = repo.fetch_sorted_by_time().await.unwrap();
    assert_eq!(sorted[0].prompt, "second");

    let updated = repo.update(1, &draft("first, revised", Category::Education)).await.unwrap();
    assert_eq!(updated.id, 1);
    assert_eq!(updated.category, Category::Education);

    repo.delete(2).await.unwrap();
    assert_eq!(repo.fetch_all().await.unwrap().len(), 1);

    let auth = state.lock().unwrap().authorization.clone();
    assert!(!auth.is_empty());
    assert!(auth.iter().all(|value| value == "Bearer tok-123"));
}

#[tokio::test]
async fn update_of_missing_row_surfaces_server_message() {
    let (base, _state) = spawn_backend().await;
    let err = chats(&base).update(99, &draft("ghost", Category::General)).await.unwrap_err();
    assert_eq!(err, ApiError::Server { status: 404, message: "Conversation not found".into() });
    assert_eq!(err.to_string(), "Conversation not found");
}

#[tokio::test]
async fn server_paging_uses_paged_endpoints() {
    let (base, _state) = spawn_backend().await;
    let repo = chats(&base);
    for i in 0..7 {
        let category = if i % 2 == 0 { Category::Coding } else { Category::General };
        repo.create(&draft(&format!("p{i}"), category)).await.unwrap();
    }

    let page = repo.fetch_page(&ListFilter::All, 1, 5).await.unwrap();
    assert_eq!(page.total_elements, 7);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.content.len(), 2);

    let coding = repo.fetch_page(&ListFilter::Category(Category::Coding), 0, 5).await.unwrap();
    assert_eq!(coding.total_elements, 4);
    assert!(coding.content.iter().all(|c| c.category == Category::Coding));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let repo = chats(&format!("http://127.0.0.1:{port}/api"));

    let err = repo.fetch_all().await.unwrap_err();

    assert!(err.is_network());
    assert_eq!(err.to_string(), convo_desk::error::NETWORK_ERROR_MESSAGE);
}

// =============================================================================
// AUTH
// =============================================================================

#[tokio::test]
async fn auth_client_login_and_signup() {
    let (base, _state) = spawn_backend().await;
    let auth = HttpAuthClient::new(format!("{base}/auth"), Timeouts::default()).unwrap();

    let ok = auth
        .login(&LoginRequest { username: "ada".into(), password: "secret1".into() })
        .await
        .unwrap();
    assert_eq!(ok.token, "tok-123");
    assert_eq!(ok.role, Role::Researcher);

    let rejected = auth
        .login(&LoginRequest { username: "ada".into(), password: "wrong".into() })
        .await
        .unwrap_err();
    assert_eq!(rejected, ApiError::Server { status: 401, message: "Invalid credentials".into() });

    let created = auth
        .signup(&SignupRequest {
            username: "bob".into(),
            password: "hunter22".into(),
            email: "bob@example.com".into(),
            role: Role::Engineer,
        })
        .await
        .unwrap();
    assert_eq!(created.username, "bob");
    assert_eq!(created.role, Role::Engineer);
}

#[tokio::test]
async fn session_store_persists_login_to_disk() {
    let (base, _state) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let auth = HttpAuthClient::new(format!("{base}/auth"), Timeouts::default()).unwrap();
    let store = SessionStore::new(auth, FileStorage::new(&path));

    assert!(matches!(store.require_session(), Err(AuthError::NotSignedIn)));

    let err = store.sign_in("ada", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!path.exists());

    let session = store.sign_in("ada", "secret1").await.unwrap();
    assert_eq!(session.user.role, Role::Researcher);
    assert!(path.exists());
    assert_eq!(store.user_role(), Some(Role::Researcher));

    store.sign_out().unwrap();
    assert!(!store.is_authenticated());
}

// =============================================================================
// VIEW-MODEL
// =============================================================================

#[tokio::test]
async fn view_model_drives_real_backend() {
    let (base, _state) = spawn_backend().await;
    let mut vm = ConversationViewModel::new(chats(&base).with_token("tok-123"));

    for i in 0..6 {
        vm.form.prompt = format!("question {i}");
        vm.form.response = "answer".into();
        vm.form.category = Category::Coding;
        vm.submit().await.unwrap();
    }
    vm.load_list(ListFilter::All, 0, 5).await.unwrap();
    assert_eq!(vm.conversations().len(), 5);
    assert_eq!(vm.total_pages(), 2);

    assert!(vm.next_page().await.unwrap());
    assert_eq!(vm.conversations().len(), 1);

    let last = vm.conversations()[0].clone();
    let outcome = vm.remove(last.id, || true).await.unwrap();
    assert_eq!(outcome, RemoveOutcome::Deleted);
    assert_eq!(vm.total_elements(), 5);
    assert!(vm.conversations().is_empty());
}

#[tokio::test]
async fn view_model_server_paging_matches_client_paging() {
    let (base, _state) = spawn_backend().await;
    let repo = chats(&base);
    for i in 0..8 {
        repo.create(&draft(&format!("p{i}"), Category::General)).await.unwrap();
    }

    let mut client = ConversationViewModel::new(chats(&base));
    let mut server = ConversationViewModel::new(chats(&base)).with_paging(PagingMode::Server);
    client.load_list(ListFilter::All, 1, 5).await.unwrap();
    server.load_list(ListFilter::All, 1, 5).await.unwrap();

    assert_eq!(client.conversations(), server.conversations());
    assert_eq!(client.total_pages(), server.total_pages());
    assert_eq!(client.summary(), server.summary());
}
