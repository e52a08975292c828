mod common;

use common::{MockBackend, identity};
use habit_app::days::{date_key, parse_date_key, schedule_day_of, today};
use habit_app::storage::LOCAL_HABITS_KEY;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct TodaySummary {
    date: String,
    total: u32,
    completed: u32,
}

#[derive(Debug, Deserialize)]
struct Habit {
    id: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct Stats {
    current_streak: u32,
    completion_rate_last_30: u32,
}

#[derive(Debug, Deserialize)]
struct AuthState {
    is_authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct Cell {
    date: String,
    in_current_month: bool,
}

#[derive(Debug, Deserialize)]
struct MonthGrid {
    weeks: Vec<Vec<Cell>>,
}

struct TestServer {
    base_url: String,
    child: Child,
    _dir: tempfile::TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(unix)]
mod cleanup {
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PIDS: Lazy<Mutex<Vec<i32>>> = Lazy::new(|| Mutex::new(Vec::new()));

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter().filter(|pid| **pid > 0) {
                unsafe {
                    libc::kill(*pid, libc::SIGTERM);
                }
            }
        }
    }
}

/// A fresh client per call keeps pooled connections off other tests' runtimes.
fn client() -> Client {
    Client::new()
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client().get(format!("{base_url}/api/auth")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(backend: &MockBackend) -> TestServer {
    spawn_server_with(backend, None).await
}

/// Starts the binary, optionally with a client state file already on disk.
async fn spawn_server_with(backend: &MockBackend, state: Option<serde_json::Value>) -> TestServer {
    let port = pick_free_port();
    let dir = tempfile::tempdir().unwrap();
    if let Some(state) = state {
        std::fs::write(dir.path().join("state.json"), state.to_string()).unwrap();
    }
    let child = Command::new(env!("CARGO_BIN_EXE_habit_app"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", dir.path().join("state.json"))
        .env("BACKEND_URL", &backend.base_url)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        child,
        _dir: dir,
    }
}

async fn today_summary(server: &TestServer) -> TodaySummary {
    client()
        .get(format!("{}/api/today", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn create_every_day_habit(server: &TestServer, name: &str) -> Habit {
    let response = client()
        .post(format!("{}/api/habits", server.base_url))
        .json(&serde_json::json!({
            "name": name,
            "days": [0, 1, 2, 3, 4, 5, 6],
            "time": "07:30",
            "color": ""
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn http_toggle_today_updates_summary_and_stats() {
    let backend = MockBackend::start().await;
    let server = spawn_server(&backend).await;

    let signed_in = client()
        .post(format!("{}/auth/telegram", server.base_url))
        .json(&identity())
        .send()
        .await
        .unwrap();
    assert!(signed_in.status().is_success());

    let habit = create_every_day_habit(&server, "Drink water").await;
    assert_eq!(habit.color, "#8b5cf6");

    let before = today_summary(&server).await;
    assert_eq!(before.date, date_key(today()));
    assert_eq!((before.completed, before.total), (0, 1));

    let toggled = client()
        .post(format!("{}/api/habits/{}/toggle", server.base_url, habit.id))
        .json(&serde_json::json!({ "date": date_key(today()), "completed": true }))
        .send()
        .await
        .unwrap();
    assert!(toggled.status().is_success());

    let after = today_summary(&server).await;
    assert_eq!((after.completed, after.total), (1, 1));

    let stats: Stats = client()
        .get(format!("{}/api/habits/{}/stats", server.base_url, habit.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.current_streak, 1);
    assert!(stats.completion_rate_last_30 > 0);

    assert_eq!(backend.habits().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_rejects_invalid_habit() {
    let backend = MockBackend::start().await;
    let server = spawn_server(&backend).await;

    let response = client()
        .post(format!("{}/api/habits", server.base_url))
        .json(&serde_json::json!({ "name": "Run", "days": [], "time": "07:00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client()
        .post(format!("{}/api/habits", server.base_url))
        .json(&serde_json::json!({ "name": "Run", "days": [0], "time": "7am" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.authorized_requests().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_unauthorized_backend_signs_out() {
    let backend = MockBackend::start().await;
    let server = spawn_server(&backend).await;

    client()
        .post(format!("{}/auth/telegram", server.base_url))
        .json(&identity())
        .send()
        .await
        .unwrap();
    backend.revoke_tokens().await;

    let response = client()
        .get(format!("{}/api/habits", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let auth: AuthState = client()
        .get(format!("{}/api/auth", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!auth.is_authenticated);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_month_calendar_is_whole_monday_weeks() {
    let backend = MockBackend::start().await;
    let server = spawn_server(&backend).await;
    // Local mode: nothing is signed in, habits stay on this device.
    let habit = create_every_day_habit(&server, "Stretch").await;

    let grid: MonthGrid = client()
        .get(format!(
            "{}/api/habits/{}/calendar?year=2026&month=2",
            server.base_url, habit.id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(grid.weeks.iter().all(|week| week.len() == 7));
    let first = parse_date_key(&grid.weeks[0][0].date).unwrap();
    assert_eq!(schedule_day_of(first), 0);
    assert_eq!(grid.weeks[0][0].date, "2026-01-26");
    assert!(!grid.weeks[0][0].in_current_month);

    let page = client()
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    assert!(page.text().await.unwrap().contains("Stretch"));

    let fragment = client()
        .get(format!(
            "{}/fragments/habits/{}/calendar?year=2026&month=2",
            server.base_url, habit.id
        ))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(fragment.contains("February 2026"));
}

#[tokio::test(flavor = "multi_thread")]
async fn http_today_reads_stored_habits_on_first_request() {
    let backend = MockBackend::start().await;
    let habits = serde_json::json!([{
        "id": "local-1-0",
        "name": "Floss",
        "days": [0, 1, 2, 3, 4, 5, 6],
        "time": "22:00",
        "completions": [{ "date": date_key(today()), "completed": true }]
    }]);
    let state = serde_json::json!({
        "entries": { LOCAL_HABITS_KEY: habits.to_string() }
    });
    let server = spawn_server_with(&backend, Some(state)).await;

    let summary = today_summary(&server).await;
    assert_eq!((summary.completed, summary.total), (1, 1));
}
