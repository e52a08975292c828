//! Backend REST client.
//!
//! Every habit call carries the stored bearer token. A 401 from the backend
//! wipes the stored credentials before the error is handed back; other non-2xx
//! statuses surface as API errors. Nothing is retried.

use crate::auth::{is_token_expired, now_seconds};
use crate::errors::AppError;
use crate::models::{AuthResponse, AuthUser, CompletionRequest, Habit, HabitInput, PlatformIdentity};
use crate::storage::ClientStore;
use reqwest::{Client, Method, Response, StatusCode, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<Mutex<ClientStore>>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<Mutex<ClientStore>>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<Mutex<ClientStore>> {
        &self.store
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    pub async fn check_health(&self) -> bool {
        match self.http.get(self.url("/api/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("health check failed: {err}");
                false
            }
        }
    }

    /// Exchanges platform init data for a token. On success the token, the user
    /// and the identity (for later silent re-auth) are stored.
    pub async fn authenticate_with_telegram(
        &self,
        identity: &PlatformIdentity,
    ) -> Result<AuthUser, AppError> {
        if identity.init_data.trim().is_empty() {
            return Err(AppError::unauthorized("No Telegram init data available"));
        }
        if identity.init_data_unsafe.get("user").is_none_or(|user| user.is_null()) {
            return Err(AppError::unauthorized("No Telegram user data available"));
        }

        let response = self
            .http
            .post(self.url("/api/auth/telegram"))
            .json(identity)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "telegram authentication rejected");
            return Err(AppError::unauthorized(format!(
                "Authentication failed: {}",
                status.as_u16()
            )));
        }

        let body: AuthResponse = response.json().await?;
        match body {
            AuthResponse {
                success: true,
                token: Some(token),
                user: Some(user),
                ..
            } => {
                let mut store = self.store.lock().await;
                store.store_auth(&token, &user).await?;
                store.store_identity(identity).await?;
                info!(user_id = user.id, "signed in");
                Ok(user)
            }
            AuthResponse { error, .. } => Err(AppError::unauthorized(
                error.unwrap_or_else(|| "Authentication failed".to_string()),
            )),
        }
    }

    /// The stored token, or a fresh one when it has expired and the platform
    /// identity is still around. Clears stored credentials when renewal fails.
    pub async fn refresh_token_if_needed(&self) -> Result<Option<String>, AppError> {
        let (token, identity) = {
            let store = self.store.lock().await;
            (store.stored_token(), store.stored_identity())
        };
        let Some(token) = token else {
            return Ok(None);
        };
        if !is_token_expired(&token, now_seconds()) {
            return Ok(Some(token));
        }

        debug!("stored token expired, re-authenticating");
        if let Some(identity) = identity {
            match self.authenticate_with_telegram(&identity).await {
                Ok(_) => return Ok(self.store.lock().await.stored_token()),
                Err(err) => warn!("re-authentication failed: {err}"),
            }
        }

        self.store.lock().await.clear_auth().await?;
        Ok(None)
    }

    async fn authenticated_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, AppError> {
        let token = self
            .refresh_token_if_needed()
            .await?
            .ok_or_else(|| AppError::unauthorized("No valid authentication token available"))?;

        let mut request = self.http.request(method.clone(), self.url(endpoint)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, endpoint, "backend rejected token, clearing credentials");
            self.store.lock().await.clear_auth().await?;
            return Err(AppError::unauthorized("Authentication failed"));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%method, endpoint, %status, "backend request failed");
            return Err(AppError::api(
                status,
                format!("API request failed: {} {text}", status.as_u16()),
            ));
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, AppError> {
        let response = self.authenticated_request(method, endpoint, body).await?;
        Ok(response.json().await?)
    }

    pub async fn fetch_habits(&self) -> Result<Vec<Habit>, AppError> {
        self.json(Method::GET, "/api/habits", None).await
    }

    pub async fn create_habit(&self, input: &HabitInput) -> Result<Habit, AppError> {
        let body = serde_json::to_value(input)?;
        self.json(Method::POST, "/api/habits", Some(body)).await
    }

    pub async fn update_habit(&self, id: &str, input: &HabitInput) -> Result<Habit, AppError> {
        let body = serde_json::to_value(input)?;
        self.json(Method::PUT, &format!("/api/habits/{id}"), Some(body)).await
    }

    pub async fn delete_habit(&self, id: &str) -> Result<(), AppError> {
        let response = self
            .authenticated_request(Method::DELETE, &format!("/api/habits/{id}"), None)
            .await?;
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        if is_json {
            // Body content is irrelevant; read it so the connection can be reused.
            let _ = response.bytes().await?;
        }
        Ok(())
    }

    /// Upserts `(date, completed)` and returns the updated habit.
    pub async fn set_completion(
        &self,
        id: &str,
        date: &str,
        completed: bool,
    ) -> Result<Habit, AppError> {
        let body = serde_json::to_value(CompletionRequest {
            date: date.to_string(),
            completed,
        })?;
        self.json(
            Method::POST,
            &format!("/api/habits/{id}/completions"),
            Some(body),
        )
        .await
    }
}
