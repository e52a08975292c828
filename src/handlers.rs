use crate::calendar::{build_month_grid_with, build_year_grid};
use crate::days::today;
use crate::errors::{AppError, ErrorKind};
use crate::habits::HabitsView;
use crate::locale::Locale;
use crate::models::{
    AuthStateResponse, CalendarQuery, Habit, HabitInput, HabitStats, HabitsResponse,
    HealthResponse, MonthGrid, PlatformIdentity, TodaySummary, ToggleRequest, YearGrid,
};
use crate::state::AppState;
use crate::stats::{compute_stats_at, today_summary_at};
use crate::templates::{HABIT_TEMPLATES, HabitTemplate};
use crate::theme::{ThemeRequest, ThemeResponse, resolve_theme};
use crate::ui::{render_index, render_month_grid, render_year_heatmap};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::Datelike;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = &state.view;
    match view.load().await {
        Err(err) if err.is_auth() => info!("showing signed-out page: {err}"),
        Err(err) => warn!("initial load failed: {err}"),
        Ok(_) => {}
    }
    let auth = view.auth_state().await;
    let habits = view.habits().await;
    let summary = today_summary_at(today(), &habits);
    let error = view.error().await;
    Html(render_index(&summary, &habits, auth.user.as_ref(), error.as_deref()))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(identity): Json<PlatformIdentity>,
) -> Result<Json<AuthStateResponse>, AppError> {
    let user = state.view.sign_in(&identity).await?;
    Ok(Json(AuthStateResponse {
        is_authenticated: true,
        user: Some(user),
    }))
}

pub async fn sign_out(State(state): State<AppState>) -> Result<Json<AuthStateResponse>, AppError> {
    state.view.sign_out().await?;
    Ok(Json(auth_response(&state.view).await))
}

pub async fn get_auth(State(state): State<AppState>) -> Json<AuthStateResponse> {
    Json(auth_response(&state.view).await)
}

async fn auth_response(view: &HabitsView) -> AuthStateResponse {
    let auth = view.auth_state().await;
    AuthStateResponse {
        is_authenticated: auth.is_authenticated,
        user: auth.user,
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        backend: state.view.api().check_health().await,
    })
}

pub async fn list_habits(State(state): State<AppState>) -> Result<Json<HabitsResponse>, AppError> {
    let habits = state.view.load().await?;
    Ok(Json(HabitsResponse {
        habits,
        error: state.view.error().await,
    }))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(input): Json<HabitInput>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = state.view.add(&input).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<HabitInput>,
) -> Result<Json<Habit>, AppError> {
    Ok(Json(state.view.update(&id, &input).await?))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.view.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_day(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = state
        .view
        .toggle_day(&id, &payload.date, payload.completed, today())
        .await?;
    Ok(Json(habit))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HabitStats>, AppError> {
    let habit = find_habit(&state.view, &id).await?;
    Ok(Json(compute_stats_at(today(), &habit)))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthGrid>, AppError> {
    let habit = find_habit(&state.view, &id).await?;
    let now = today();
    let overlay = state.view.overlay(&id).await;
    let grid = build_month_grid_with(
        query.year.unwrap_or(now.year()),
        query.month.unwrap_or(now.month()),
        &habit,
        now,
        &overlay,
    )?;
    Ok(Json(grid))
}

pub async fn get_year(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<YearGrid>, AppError> {
    let habit = find_habit(&state.view, &id).await?;
    let now = today();
    Ok(Json(build_year_grid(query.year.unwrap_or(now.year()), &habit, now)?))
}

pub async fn calendar_fragment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Html<String>, AppError> {
    let habit = find_habit(&state.view, &id).await?;
    let locale = user_locale(&state.view).await;
    let Json(grid) = get_calendar(State(state), Path(id), Query(query)).await?;
    Ok(Html(render_month_grid(&grid, &habit.color, today(), locale)))
}

pub async fn year_fragment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Html<String>, AppError> {
    let habit = find_habit(&state.view, &id).await?;
    let now = today();
    let grid = build_year_grid(query.year.unwrap_or(now.year()), &habit, now)?;
    let locale = user_locale(&state.view).await;
    Ok(Html(render_year_heatmap(&grid, &habit.color, locale)))
}

pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodaySummary>, AppError> {
    let habits = state.view.load().await?;
    Ok(Json(today_summary_at(today(), &habits)))
}

pub async fn get_templates() -> Json<Vec<HabitTemplate>> {
    Json(HABIT_TEMPLATES.to_vec())
}

pub async fn post_theme(Json(request): Json<ThemeRequest>) -> Json<ThemeResponse> {
    Json(resolve_theme(&request))
}

async fn user_locale(view: &HabitsView) -> Locale {
    Locale::for_user(view.auth_state().await.user.as_ref())
}

/// Looks in the last fetched list first, re-fetching once on a miss.
async fn find_habit(view: &HabitsView, id: &str) -> Result<Habit, AppError> {
    match view.habit(id).await {
        Err(err) if err.kind == ErrorKind::NotFound => {
            view.refresh().await?;
            view.habit(id).await
        }
        other => other,
    }
}
