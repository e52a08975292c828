use crate::api::ApiClient;
use crate::auth::{AuthState, auth_state};
use crate::days::{date_key, parse_date_key};
use crate::errors::{AppError, ErrorKind};
use crate::migration::migrate_local_habits;
use crate::models::{AuthUser, Habit, HabitInput, PlatformIdentity};
use crate::overlay::OptimisticOverlay;
use crate::validation::validate_input;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

static LOCAL_ID_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Default)]
struct ViewState {
    habits: Vec<Habit>,
    error: Option<String>,
    overlays: HashMap<String, OptimisticOverlay>,
}

/// The habit list as the UI sees it. The server (or the local store, before
/// sign-in) is the only source of truth: every mutation is followed by a full
/// re-fetch, and the last failure is kept for the error banner.
#[derive(Clone)]
pub struct HabitsView {
    api: ApiClient,
    state: Arc<Mutex<ViewState>>,
}

impl HabitsView {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(ViewState::default())),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn auth_state(&self) -> AuthState {
        auth_state(&*self.api.store().lock().await)
    }

    /// A stored token routes calls to the backend; the client refreshes or
    /// drops it there.
    async fn uses_backend(&self) -> bool {
        self.api.store().lock().await.stored_token().is_some()
    }

    pub async fn habits(&self) -> Vec<Habit> {
        self.state.lock().await.habits.clone()
    }

    pub async fn habit(&self, id: &str) -> Result<Habit, AppError> {
        self.state
            .lock()
            .await
            .habits
            .iter()
            .find(|habit| habit.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn overlay(&self, id: &str) -> OptimisticOverlay {
        self.state
            .lock()
            .await
            .overlays
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn refresh(&self) -> Result<Vec<Habit>, AppError> {
        let habits = if self.uses_backend().await {
            self.api.fetch_habits().await?
        } else {
            self.api.store().lock().await.local_habits()
        };

        let mut state = self.state.lock().await;
        state.habits = habits.clone();
        for overlay in state.overlays.values_mut() {
            overlay.reconcile();
        }
        state.overlays.retain(|_, overlay| !overlay.is_empty());
        Ok(habits)
    }

    /// Initial load. Signs in again first when credentials are gone but the
    /// platform identity is still known.
    pub async fn load(&self) -> Result<Vec<Habit>, AppError> {
        let (authenticated, identity) = {
            let store = self.api.store().lock().await;
            (auth_state(&store).is_authenticated, store.stored_identity())
        };
        if !authenticated {
            if let Some(identity) = identity {
                if let Err(err) = self.api.authenticate_with_telegram(&identity).await {
                    warn!("automatic sign-in failed: {err}");
                }
            }
        }
        self.with_refresh(async { Ok(()) }).await?;
        Ok(self.habits().await)
    }

    async fn with_refresh<T>(
        &self,
        action: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        let outcome = match action.await {
            Ok(value) => self.refresh().await.map(|_| value),
            Err(err) => Err(err),
        };
        let mut state = self.state.lock().await;
        match &outcome {
            Ok(_) => state.error = None,
            Err(err) if err.kind == ErrorKind::Validation => {}
            Err(err) => state.error = Some(err.message.clone()),
        }
        outcome
    }

    pub async fn sign_in(&self, identity: &PlatformIdentity) -> Result<AuthUser, AppError> {
        let user = self.api.authenticate_with_telegram(identity).await?;
        match migrate_local_habits(&self.api).await {
            Ok(report) if report.migrated > 0 => info!(migrated = report.migrated, "local habits moved"),
            Ok(_) => {}
            Err(err) => warn!("local habit migration failed: {err}"),
        }
        self.with_refresh(async { Ok(()) }).await?;
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.api.store().lock().await.clear_auth().await?;
        self.with_refresh(async { Ok(()) }).await
    }

    pub async fn add(&self, input: &HabitInput) -> Result<Habit, AppError> {
        let input = validate_input(input)?;
        self.with_refresh(async {
            if self.uses_backend().await {
                self.api.create_habit(&input).await
            } else {
                self.add_local(input).await
            }
        })
        .await
    }

    pub async fn update(&self, id: &str, input: &HabitInput) -> Result<Habit, AppError> {
        let input = validate_input(input)?;
        self.with_refresh(async {
            if self.uses_backend().await {
                self.api.update_habit(id, &input).await
            } else {
                self.edit_local(id, |habit| {
                    habit.name = input.name.clone();
                    habit.days = input.days.clone();
                    habit.time = input.time.clone();
                    habit.color = input.color.clone();
                })
                .await
            }
        })
        .await
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        self.with_refresh(async {
            if self.uses_backend().await {
                self.api.delete_habit(id).await
            } else {
                let mut store = self.api.store().lock().await;
                let mut habits = store.local_habits();
                let before = habits.len();
                habits.retain(|habit| habit.id != id);
                if habits.len() == before {
                    return Err(AppError::not_found(format!("habit {id} not found")));
                }
                store.set_local_habits(&habits).await
            }
        })
        .await
    }

    pub async fn set_completion(
        &self,
        id: &str,
        date: &str,
        completed: bool,
    ) -> Result<Habit, AppError> {
        let date = checked_date(date)?;
        self.with_refresh(self.write_completion(id, &date, completed)).await
    }

    /// Calendar tap: shows the new state at once, refuses a second tap on the
    /// same date until the first settles, then resynchronizes with the server.
    pub async fn toggle_day(
        &self,
        id: &str,
        date: &str,
        completed: bool,
        today: NaiveDate,
    ) -> Result<Habit, AppError> {
        let day = parse_date_key(date)
            .ok_or_else(|| AppError::validation(format!("invalid date {date:?}")))?;
        if day > today {
            return Err(AppError::validation("future days cannot be marked"));
        }
        let date = date_key(day);

        {
            let mut state = self.state.lock().await;
            if !state.overlays.entry(id.to_string()).or_default().begin(&date, completed) {
                return Err(AppError::conflict(format!("{date} is already being saved")));
            }
        }

        let result = self.write_completion(id, &date, completed).await;
        {
            let mut state = self.state.lock().await;
            if let Some(overlay) = state.overlays.get_mut(id) {
                match result {
                    Ok(_) => overlay.settle(&date),
                    Err(_) => overlay.rollback(&date),
                }
            }
        }
        self.with_refresh(async { result }).await
    }

    async fn write_completion(&self, id: &str, date: &str, completed: bool) -> Result<Habit, AppError> {
        if self.uses_backend().await {
            self.api.set_completion(id, date, completed).await
        } else {
            self.edit_local(id, |habit| habit.set_completion(date, completed))
                .await
        }
    }

    async fn add_local(&self, input: HabitInput) -> Result<Habit, AppError> {
        let now = Utc::now();
        let mut store = self.api.store().lock().await;
        let mut habits = store.local_habits();
        let habit = Habit {
            id: next_local_id(&habits, now.timestamp_millis()),
            name: input.name,
            days: input.days,
            time: input.time,
            color: input.color,
            created_at: now.to_rfc3339(),
            completions: Some(Vec::new()),
        };
        habits.push(habit.clone());
        store.set_local_habits(&habits).await?;
        Ok(habit)
    }

    async fn edit_local(
        &self,
        id: &str,
        edit: impl FnOnce(&mut Habit),
    ) -> Result<Habit, AppError> {
        let mut store = self.api.store().lock().await;
        let mut habits = store.local_habits();
        let habit = habits
            .iter_mut()
            .find(|habit| habit.id == id)
            .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))?;
        edit(habit);
        let updated = habit.clone();
        store.set_local_habits(&habits).await?;
        Ok(updated)
    }
}

/// Millisecond stamp plus a process-wide sequence, re-drawn while it matches
/// an id already on the device.
fn next_local_id(existing: &[Habit], millis: i64) -> String {
    loop {
        let seq = LOCAL_ID_SEQ.fetch_add(1, Ordering::Relaxed);
        let id = format!("local-{millis}-{seq}");
        if !existing.iter().any(|habit| habit.id == id) {
            return id;
        }
    }
}

fn checked_date(date: &str) -> Result<String, AppError> {
    parse_date_key(date)
        .map(date_key)
        .ok_or_else(|| AppError::validation(format!("invalid date {date:?}")))
}
