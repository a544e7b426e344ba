//! services/dashboard/src/adapters/notifications.rs
//!
//! The `NotificationService` port over the remote `/notifications` endpoints.

use super::remote::{parse_optional_timestamp, Envelope, RemoteClient};
use async_trait::async_trait;
use chrono::FixedOffset;
use dairy_track_core::domain::{
    NotificationFeed, NotificationId, NotificationRecord, NotificationType, UserId,
};
use dairy_track_core::ports::{NotificationService, PortError, PortResult};
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;

const FETCH_FAILED: &str = "Failed to fetch notifications";
const DELETE_FAILED: &str = "Failed to delete notification";
const MARK_FAILED: &str = "Failed to mark notification as read";

#[derive(Debug, Deserialize)]
struct NotificationRow {
    id: NotificationId,
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    created_at_wib: Option<String>,
}

impl NotificationRow {
    fn to_domain(self, local: FixedOffset) -> NotificationRecord {
        NotificationRecord {
            id: self.id,
            message: self.message,
            kind: self
                .kind
                .as_deref()
                .map(NotificationType::from_wire)
                .unwrap_or(NotificationType::Other),
            is_read: self.is_read,
            created_at: parse_optional_timestamp(self.created_at.as_deref(), local),
            created_at_wib: parse_optional_timestamp(self.created_at_wib.as_deref(), local),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NotificationListResponse {
    #[serde(default)]
    notifications: Vec<NotificationRow>,
    #[serde(default)]
    unread_count: usize,
}

/// Talks to the remote on behalf of one user.
#[derive(Clone)]
pub struct HttpNotificationAdapter {
    remote: Arc<RemoteClient>,
    user_id: Option<UserId>,
}

impl HttpNotificationAdapter {
    pub fn new(remote: Arc<RemoteClient>, user_id: Option<UserId>) -> Self {
        Self { remote, user_id }
    }

    fn require_user(&self) -> PortResult<UserId> {
        self.user_id.ok_or(PortError::Auth)
    }
}

#[async_trait]
impl NotificationService for HttpNotificationAdapter {
    async fn fetch_notifications(&self) -> PortResult<NotificationFeed> {
        let user_id = self.require_user()?;
        let request = self
            .remote
            .request(Method::GET, "notifications")
            .query(&[("user_id", user_id.0)]);
        let response: NotificationListResponse = self.remote.send(request, FETCH_FAILED).await?;
        let local = self.remote.local_offset();

        Ok(NotificationFeed {
            records: response
                .notifications
                .into_iter()
                .map(|row| row.to_domain(local))
                .collect(),
            unread_count: response.unread_count,
        })
    }

    async fn delete_notification(&self, id: NotificationId, user_id: UserId) -> PortResult<()> {
        let path = format!("notifications/{}", id);
        let request = self
            .remote
            .request(Method::DELETE, &path)
            .query(&[("user_id", user_id.0)]);
        let envelope: Envelope = self.remote.send(request, DELETE_FAILED).await?;
        envelope.into_result(DELETE_FAILED)
    }

    async fn mark_notification_read(&self, id: NotificationId) -> PortResult<()> {
        let user_id = self.require_user()?;
        let path = format!("notifications/{}/read", id);
        let request = self
            .remote
            .request(Method::PUT, &path)
            .query(&[("user_id", user_id.0)]);
        let envelope: Envelope = self.remote.send(request, MARK_FAILED).await?;
        envelope.into_result(MARK_FAILED)
    }
}
