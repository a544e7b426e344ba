//! services/dashboard/src/adapters/user_store.rs
//!
//! Reads the persisted user descriptor written by the login flow.
//!
//! The file holds a JSON object with either `id` or `user_id` (number or
//! numeric string), an optional `role_id`, and optional `name`/`username`.
//! A missing or unreadable file means nobody is logged in.

use super::remote::Numeric;
use dairy_track_core::domain::CurrentUser;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct StoredUser {
    #[serde(default)]
    id: Option<Numeric>,
    #[serde(default)]
    user_id: Option<Numeric>,
    #[serde(default)]
    role_id: Option<Numeric>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl StoredUser {
    fn into_current_user(self) -> Option<CurrentUser> {
        CurrentUser::from_descriptor(
            self.id.as_ref().and_then(Numeric::as_i64),
            self.user_id.as_ref().and_then(Numeric::as_i64),
            self.role_id.as_ref().and_then(Numeric::as_i64),
            self.name,
            self.username,
        )
    }
}

/// Parses a descriptor. Anything that does not name a user yields `None`.
pub fn parse_current_user(raw: &str) -> Option<CurrentUser> {
    match serde_json::from_str::<Option<StoredUser>>(raw) {
        Ok(stored) => stored.and_then(StoredUser::into_current_user),
        Err(e) => {
            warn!("Ignoring malformed user descriptor: {}", e);
            None
        }
    }
}

pub async fn load_current_user(path: &Path) -> Option<CurrentUser> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No user descriptor found; running anonymously");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), "Could not read user descriptor: {}", e);
            return None;
        }
    };

    let user = parse_current_user(&raw);
    match &user {
        Some(user) => info!(user_id = %user.user_id, role = user.role.label(), "Loaded current user"),
        None => info!("User descriptor names no user; running anonymously"),
    }
    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use dairy_track_core::domain::{Role, UserId};

    #[test]
    fn user_id_as_string_is_accepted() {
        let user = parse_current_user(r#"{"user_id": "42", "role_id": 1, "name": "Admin"}"#).unwrap();
        assert_eq!(user.user_id, UserId(42));
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn id_is_used_when_user_id_is_absent() {
        let user = parse_current_user(r#"{"id": 7, "role_id": "3", "username": "budi"}"#).unwrap();
        assert_eq!(user.user_id, UserId(7));
        assert_eq!(user.role, Role::Farmer);
        assert_eq!(user.display_name(), "budi");
    }

    #[test]
    fn null_empty_and_garbage_are_anonymous() {
        assert!(parse_current_user("null").is_none());
        assert!(parse_current_user("{}").is_none());
        assert!(parse_current_user("not json").is_none());
    }

    #[tokio::test]
    async fn missing_file_is_anonymous() {
        let path = std::env::temp_dir().join(format!("dashboard-no-user-{}.json", uuid::Uuid::new_v4()));
        assert!(load_current_user(&path).await.is_none());
    }

    #[tokio::test]
    async fn file_on_disk_is_loaded() {
        let path = std::env::temp_dir().join(format!("dashboard-user-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, r#"{"id": 3, "role_id": 2}"#).await.unwrap();
        let user = load_current_user(&path).await.unwrap();
        assert_eq!(user.role, Role::Supervisor);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
