use crate::api::ApiClient;
use crate::errors::AppError;
use crate::models::{Habit, HabitInput};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Where habits live. A sign-in moves `Local -> Migrating -> Backend`; a failed
/// run falls back to `Local` with whatever was not moved yet. Habits added on the
/// device after a sign-out are moved on the next sign-in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MigrationState {
    #[default]
    Local,
    Migrating,
    Backend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
}

pub async fn migrate_local_habits(api: &ApiClient) -> Result<MigrationReport, AppError> {
    let mut pending = {
        let mut store = api.store().lock().await;
        let pending = store.local_habits();
        if pending.is_empty() {
            if store.migration_state() != MigrationState::Backend {
                store.set_migration_state(MigrationState::Backend).await?;
            }
            return Ok(MigrationReport::default());
        }
        store.set_migration_state(MigrationState::Migrating).await?;
        pending
    };
    info!(count = pending.len(), "migrating local habits");

    let mut migrated = 0;
    while let Some(habit) = pending.first().cloned() {
        if let Err(err) = migrate_one(api, &habit).await {
            warn!(habit = %habit.name, "migration stopped: {err}");
            let mut store = api.store().lock().await;
            store.set_local_habits(&pending).await?;
            store.set_migration_state(MigrationState::Local).await?;
            return Err(err);
        }
        pending.remove(0);
        migrated += 1;
        api.store().lock().await.set_local_habits(&pending).await?;
    }

    api.store()
        .lock()
        .await
        .set_migration_state(MigrationState::Backend)
        .await?;
    Ok(MigrationReport { migrated })
}

async fn migrate_one(api: &ApiClient, habit: &Habit) -> Result<(), AppError> {
    let created = api.create_habit(&HabitInput::from(habit)).await?;
    for completion in habit.completions.iter().flatten().filter(|c| c.completed) {
        api.set_completion(&created.id, &completion.date, true).await?;
    }
    Ok(())
}
