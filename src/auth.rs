use crate::models::AuthUser;
use crate::storage::ClientStore;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// A token that cannot be read counts as expired; one without `exp` never
/// expires on this side.
pub fn is_token_expired(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Some(claims) => claims.exp.is_some_and(|exp| exp < now),
        None => true,
    }
}

pub fn now_seconds() -> i64 {
    Utc::now().timestamp()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub user: Option<AuthUser>,
}

pub fn auth_state(store: &ClientStore) -> AuthState {
    auth_state_at(store, now_seconds())
}

pub fn auth_state_at(store: &ClientStore, now: i64) -> AuthState {
    match (store.stored_token(), store.stored_user()) {
        (Some(token), Some(user)) if !is_token_expired(&token, now) => AuthState {
            is_authenticated: true,
            token: Some(token),
            user: Some(user),
        },
        _ => AuthState {
            is_authenticated: false,
            token: None,
            user: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn expiry_is_read_from_payload() {
        assert!(!is_token_expired(&token(r#"{"exp":2000}"#), 1000));
        assert!(is_token_expired(&token(r#"{"exp":2000}"#), 3000));
        assert!(!is_token_expired(&token(r#"{"sub":"1"}"#), 3000));
    }

    #[test]
    fn malformed_tokens_are_expired() {
        assert!(is_token_expired("not-a-jwt", 0));
        assert!(is_token_expired("a.%%%.c", 0));
        assert!(is_token_expired(&token("plain text"), 0));
    }

    #[tokio::test]
    async fn state_requires_token_and_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ClientStore::open(dir.path().join("state.json")).await;
        assert!(!auth_state_at(&store, 0).is_authenticated);

        let user = AuthUser {
            id: 1,
            first_name: None,
            last_name: None,
            username: None,
            language_code: None,
            photo_url: None,
        };
        store.store_auth(&token(r#"{"exp":100}"#), &user).await.unwrap();
        assert!(auth_state_at(&store, 50).is_authenticated);

        let expired = auth_state_at(&store, 500);
        assert!(!expired.is_authenticated);
        assert_eq!(expired.token, None);
    }
}
