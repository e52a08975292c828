use crate::errors::AppError;
use crate::migration::MigrationState;
use crate::models::{AuthUser, Habit, PlatformIdentity};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{error, warn};

pub const TOKEN_KEY: &str = "habit_app_jwt_token";
pub const USER_KEY: &str = "habit_app_user";
pub const IDENTITY_KEY: &str = "habit_app_platform_identity";
pub const LOCAL_HABITS_KEY: &str = "habit_app_local_habits";
pub const MIGRATION_KEY: &str = "habit_app_migration_state";

/// Key/value client state, persisted as one JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientData {
    pub entries: BTreeMap<String, String>,
}

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> ClientData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse client state: {err}");
                ClientData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => ClientData::default(),
        Err(err) => {
            error!("failed to read client state: {err}");
            ClientData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &ClientData) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// The client's browser-storage equivalent: every write is persisted at once.
#[derive(Debug)]
pub struct ClientStore {
    path: PathBuf,
    data: ClientData,
}

impl ClientStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self { path, data }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.entries.get(key).map(String::as_str)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("ignoring unreadable {key}: {err}");
                None
            }
        }
    }

    async fn flush(&self) -> Result<(), AppError> {
        persist_data(&self.path, &self.data).await
    }

    pub async fn store_auth(&mut self, token: &str, user: &AuthUser) -> Result<(), AppError> {
        let user = serde_json::to_string(user)?;
        self.data.entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.data.entries.insert(USER_KEY.to_string(), user);
        self.flush().await
    }

    pub fn stored_token(&self) -> Option<String> {
        self.get(TOKEN_KEY).map(str::to_string)
    }

    pub fn stored_user(&self) -> Option<AuthUser> {
        self.get_json(USER_KEY)
    }

    /// Drops the token and the user together.
    pub async fn clear_auth(&mut self) -> Result<(), AppError> {
        let had_token = self.data.entries.remove(TOKEN_KEY).is_some();
        let had_user = self.data.entries.remove(USER_KEY).is_some();
        if had_token || had_user {
            self.flush().await?;
        }
        Ok(())
    }

    pub async fn store_identity(&mut self, identity: &PlatformIdentity) -> Result<(), AppError> {
        let identity = serde_json::to_string(identity)?;
        self.data.entries.insert(IDENTITY_KEY.to_string(), identity);
        self.flush().await
    }

    pub fn stored_identity(&self) -> Option<PlatformIdentity> {
        self.get_json(IDENTITY_KEY)
    }

    pub fn local_habits(&self) -> Vec<Habit> {
        self.get_json(LOCAL_HABITS_KEY).unwrap_or_default()
    }

    pub async fn set_local_habits(&mut self, habits: &[Habit]) -> Result<(), AppError> {
        if habits.is_empty() {
            self.data.entries.remove(LOCAL_HABITS_KEY);
        } else {
            let habits = serde_json::to_string(habits)?;
            self.data.entries.insert(LOCAL_HABITS_KEY.to_string(), habits);
        }
        self.flush().await
    }

    pub fn migration_state(&self) -> MigrationState {
        self.get_json(MIGRATION_KEY).unwrap_or_default()
    }

    pub async fn set_migration_state(&mut self, state: MigrationState) -> Result<(), AppError> {
        let state = serde_json::to_string(&state)?;
        self.data.entries.insert(MIGRATION_KEY.to_string(), state);
        self.flush().await
    }
}
