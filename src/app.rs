use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/auth/telegram", post(handlers::sign_in))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route("/api/auth", get(handlers::get_auth))
        .route("/api/health", get(handlers::health))
        .route("/api/habits", get(handlers::list_habits).post(handlers::create_habit))
        .route("/api/habits/:id", put(handlers::update_habit).delete(handlers::delete_habit))
        .route("/api/habits/:id/toggle", post(handlers::toggle_day))
        .route("/api/habits/:id/stats", get(handlers::get_stats))
        .route("/api/habits/:id/calendar", get(handlers::get_calendar))
        .route("/api/habits/:id/year", get(handlers::get_year))
        .route("/fragments/habits/:id/calendar", get(handlers::calendar_fragment))
        .route("/fragments/habits/:id/year", get(handlers::year_fragment))
        .route("/api/today", get(handlers::get_today))
        .route("/api/templates", get(handlers::get_templates))
        .route("/api/theme", post(handlers::post_theme))
        .with_state(state)
}
