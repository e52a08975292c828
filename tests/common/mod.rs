#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use habit_app::models::{CompletionRequest, Habit, HabitInput, PlatformIdentity};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const FAR_FUTURE: i64 = 4_102_444_800;

pub fn make_token(exp: i64, nonce: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(json!({ "sub": "42", "exp": exp, "nonce": nonce }).to_string())
    )
}

pub fn identity() -> PlatformIdentity {
    PlatformIdentity {
        init_data: "query_id=AAE&user=%7B%22id%22%3A42%7D&hash=abc".to_string(),
        init_data_unsafe: json!({ "user": { "id": 42, "first_name": "Ada" } }),
    }
}

#[derive(Default)]
pub struct MockState {
    pub habits: Vec<Habit>,
    pub next_id: u64,
    pub valid_token: String,
    pub fail_with: Option<StatusCode>,
    pub auth_calls: u32,
    pub authorized_requests: u32,
}

/// In-process stand-in for the habits REST backend.
#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<Mutex<MockState>>,
}

type Shared = State<Arc<Mutex<MockState>>>;

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            valid_token: make_token(FAR_FUTURE, "first"),
            next_id: 1,
            ..MockState::default()
        }));

        let app = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .route("/api/auth/telegram", post(auth_telegram))
            .route("/api/habits", get(list).post(create))
            .route("/api/habits/:id", put(update).delete(remove))
            .route("/api/habits/:id/completions", post(complete))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Every token handed out so far stops working.
    pub async fn revoke_tokens(&self) {
        self.state.lock().await.valid_token = make_token(FAR_FUTURE, "rotated");
    }

    pub async fn fail_with(&self, status: Option<StatusCode>) {
        self.state.lock().await.fail_with = status;
    }

    pub async fn habits(&self) -> Vec<Habit> {
        self.state.lock().await.habits.clone()
    }

    pub async fn auth_calls(&self) -> u32 {
        self.state.lock().await.auth_calls
    }

    pub async fn authorized_requests(&self) -> u32 {
        self.state.lock().await.authorized_requests
    }
}

async fn auth_telegram(State(state): Shared, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().await;
    state.auth_calls += 1;
    if body.get("initData").and_then(Value::as_str).unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, "missing initData").into_response();
    }
    Json(json!({
        "success": true,
        "token": state.valid_token,
        "user": { "id": 42, "first_name": "Ada", "username": "ada" }
    }))
    .into_response()
}

fn authorize(state: &mut MockState, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", state.valid_token);
    let given = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if given != Some(expected.as_str()) {
        return Err((StatusCode::UNAUTHORIZED, "invalid token").into_response());
    }
    state.authorized_requests += 1;
    if let Some(status) = state.fail_with {
        return Err((status, "backend exploded").into_response());
    }
    Ok(())
}

async fn list(State(state): Shared, headers: HeaderMap) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = authorize(&mut state, &headers) {
        return response;
    }
    Json(state.habits.clone()).into_response()
}

async fn create(State(state): Shared, headers: HeaderMap, Json(input): Json<HabitInput>) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = authorize(&mut state, &headers) {
        return response;
    }
    let habit = Habit {
        id: state.next_id.to_string(),
        name: input.name,
        days: input.days,
        time: input.time,
        color: input.color,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        completions: Some(Vec::new()),
    };
    state.next_id += 1;
    state.habits.push(habit.clone());
    (StatusCode::CREATED, Json(habit)).into_response()
}

async fn update(
    State(state): Shared,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<HabitInput>,
) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = authorize(&mut state, &headers) {
        return response;
    }
    match state.habits.iter_mut().find(|habit| habit.id == id) {
        Some(habit) => {
            habit.name = input.name;
            habit.days = input.days;
            habit.time = input.time;
            habit.color = input.color;
            Json(habit.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such habit").into_response(),
    }
}

async fn remove(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = authorize(&mut state, &headers) {
        return response;
    }
    state.habits.retain(|habit| habit.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn complete(
    State(state): Shared,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CompletionRequest>,
) -> Response {
    let mut state = state.lock().await;
    if let Err(response) = authorize(&mut state, &headers) {
        return response;
    }
    match state.habits.iter_mut().find(|habit| habit.id == id) {
        Some(habit) => {
            habit.set_completion(&request.date, request.completed);
            Json(habit.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such habit").into_response(),
    }
}
