//! services/dashboard/src/adapters/milking.rs
//!
//! The `MilkingSessionService` port over `/milking-sessions`.

use super::remote::{parse_optional_timestamp, parse_timestamp, Envelope, Numeric, RemoteClient};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use dairy_track_core::domain::{CowId, MilkingSessionDraft, MilkingSessionId, MilkingSessionRecord};
use dairy_track_core::ports::{MilkingSessionService, PortResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

const FETCH_FAILED: &str = "Failed to fetch milking sessions";
const ADD_FAILED: &str = "Failed to add milking session";
const EDIT_FAILED: &str = "Failed to update milking session";
const DELETE_FAILED: &str = "Failed to delete milking session";

#[derive(Debug, Deserialize)]
struct SessionRow {
    id: MilkingSessionId,
    cow_id: CowId,
    #[serde(default)]
    cow_name: Option<String>,
    #[serde(default)]
    milker_id: Option<Numeric>,
    #[serde(default)]
    milker_name: Option<String>,
    volume: Numeric,
    milking_time: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl SessionRow {
    /// Rows with an unreadable time or volume are dropped rather than failing the whole list.
    fn to_domain(self, local: FixedOffset) -> Option<MilkingSessionRecord> {
        let Some(milking_time) = parse_timestamp(&self.milking_time, local) else {
            warn!(session_id = self.id, raw = %self.milking_time, "skipping session with unreadable milking_time");
            return None;
        };
        let Some(volume) = self.volume.as_f64().filter(|v| v.is_finite() && *v >= 0.0) else {
            warn!(session_id = self.id, "skipping session with unreadable volume");
            return None;
        };
        Some(MilkingSessionRecord {
            id: self.id,
            cow_id: self.cow_id,
            cow_name: self.cow_name.filter(|n| !n.is_empty()),
            milker_id: self.milker_id.as_ref().and_then(Numeric::as_i64).unwrap_or(0),
            milker_name: self.milker_name.filter(|n| !n.is_empty()),
            volume,
            milking_time,
            notes: self.notes.unwrap_or_default(),
            created_at: parse_optional_timestamp(self.created_at.as_deref(), local),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SessionListResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default)]
    sessions: Vec<SessionRow>,
}

/// The body sent for add and edit.
#[derive(Debug, Serialize)]
struct SessionBody<'a> {
    cow_id: CowId,
    milker_id: Option<i64>,
    volume: f64,
    milking_time: String,
    notes: &'a str,
}

impl<'a> SessionBody<'a> {
    fn from_draft(draft: &'a MilkingSessionDraft) -> Self {
        Self {
            cow_id: draft.cow_id,
            milker_id: draft.milker_id,
            volume: draft.volume,
            milking_time: wire_time(draft.milking_time),
            notes: draft.notes.as_deref().unwrap_or(""),
        }
    }
}

fn wire_time(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Clone)]
pub struct HttpMilkingSessionAdapter {
    remote: Arc<RemoteClient>,
}

impl HttpMilkingSessionAdapter {
    pub fn new(remote: Arc<RemoteClient>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl MilkingSessionService for HttpMilkingSessionAdapter {
    async fn get_milking_sessions(&self) -> PortResult<Vec<MilkingSessionRecord>> {
        let response: SessionListResponse = self.remote.get("milking-sessions", FETCH_FAILED).await?;
        response.envelope.into_result(FETCH_FAILED)?;
        let local = self.remote.local_offset();
        Ok(response
            .sessions
            .into_iter()
            .filter_map(|row| row.to_domain(local))
            .collect())
    }

    async fn add_milking_session(&self, draft: &MilkingSessionDraft) -> PortResult<()> {
        self.remote
            .send_json(Method::POST, "milking-sessions", &SessionBody::from_draft(draft), ADD_FAILED)
            .await
    }

    async fn edit_milking_session(
        &self,
        id: MilkingSessionId,
        draft: &MilkingSessionDraft,
    ) -> PortResult<()> {
        let path = format!("milking-sessions/{}", id);
        self.remote
            .send_json(Method::PUT, &path, &SessionBody::from_draft(draft), EDIT_FAILED)
            .await
    }

    async fn delete_milking_session(&self, id: MilkingSessionId) -> PortResult<()> {
        let path = format!("milking-sessions/{}", id);
        self.remote.command(Method::DELETE, &path, DELETE_FAILED).await
    }
}
