//! crates/dairy_track_core/src/milking_book.rs
//!
//! The page-level list of milking sessions and the herd lookups that feed
//! its forms. Every successful write is followed by a full reload; the local
//! list is never merged optimistically.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::context::SessionContext;
use crate::domain::{
    Cow, CowId, CurrentUser, Farmer, MilkingSessionDraft, MilkingSessionId, MilkingSessionRecord,
};
use crate::ports::{
    ConfirmPrompt, Confirmer, HerdDirectory, MilkingSessionService, PortError, PortResult,
};
use crate::session_view::{self, LocalCalendar, SessionProjection, SessionQuery};

const MISSING_MILKER: &str = "Please select a milker for this session.";
const UNKNOWN_MILKER: &str = "Unable to determine milker ID. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDeleteOutcome {
    Deleted,
    Declined,
}

/// The line appended to a session's notes recording who created it.
pub fn creator_line(user: Option<&CurrentUser>) -> String {
    match user {
        Some(user) => format!(
            "Created by: {} (Role: {}, ID: {})",
            user.display_name(),
            user.role.label(),
            user.user_id
        ),
        None => "Created by: Unknown".to_string(),
    }
}

pub struct MilkingSessionBook {
    context: Arc<SessionContext>,
    sessions_api: Arc<dyn MilkingSessionService>,
    herd: Arc<dyn HerdDirectory>,
    sessions: RwLock<Vec<MilkingSessionRecord>>,
}

impl MilkingSessionBook {
    pub fn new(
        context: Arc<SessionContext>,
        sessions_api: Arc<dyn MilkingSessionService>,
        herd: Arc<dyn HerdDirectory>,
    ) -> Self {
        Self {
            context,
            sessions_api,
            herd,
            sessions: RwLock::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub async fn sessions(&self) -> Vec<MilkingSessionRecord> {
        self.sessions.read().await.clone()
    }

    //=====================================================================================
    // Loading and projection
    //=====================================================================================

    /// Replaces the local list with the remote one. On failure the list is emptied.
    pub async fn load(&self) -> PortResult<usize> {
        match self.sessions_api.get_milking_sessions().await {
            Ok(sessions) => {
                let count = sessions.len();
                *self.sessions.write().await = sessions;
                info!(count, "milking sessions loaded");
                Ok(count)
            }
            Err(e) => {
                error!("Failed to fetch milking sessions: {}", e);
                self.sessions.write().await.clear();
                Err(e)
            }
        }
    }

    /// Loads the caller's managed cows into the context's scope.
    pub async fn load_managed_cows(&self) -> PortResult<usize> {
        let Some(user_id) = self.context.user_id() else {
            return Ok(0);
        };
        let cows = self.herd.list_cows_by_user(user_id).await?;
        let count = cows.len();
        self.context.set_managed_cows(cows);
        info!(%user_id, count, "managed cows loaded");
        Ok(count)
    }

    pub async fn project(&self, query: &SessionQuery, calendar: &LocalCalendar) -> SessionProjection {
        let sessions = self.sessions.read().await;
        session_view::project(&sessions, &self.context.scope(), query, calendar)
    }

    //=====================================================================================
    // Writes
    //=====================================================================================

    /// Records a new session for the caller.
    ///
    /// Admins must pick the milker. Everyone else milks as themselves.
    pub async fn add(&self, mut draft: MilkingSessionDraft) -> PortResult<()> {
        draft.milker_id = Some(self.resolve_milker(draft.milker_id)?);
        let creator = creator_line(self.context.user());
        draft.notes = Some(match draft.notes.as_deref().map(str::trim) {
            Some(notes) if !notes.is_empty() => format!("{}\n\n{}", notes, creator),
            _ => creator,
        });
        check_volume(draft.volume)?;

        self.sessions_api.add_milking_session(&draft).await.map_err(|e| {
            error!(cow_id = draft.cow_id, "Failed to add milking session: {}", e);
            e
        })?;
        info!(cow_id = draft.cow_id, "milking session added");
        self.reload_after_write().await;
        Ok(())
    }

    pub async fn edit(&self, id: MilkingSessionId, draft: MilkingSessionDraft) -> PortResult<()> {
        check_volume(draft.volume)?;
        self.sessions_api
            .edit_milking_session(id, &draft)
            .await
            .map_err(|e| {
                error!(session_id = id, "Failed to update milking session: {}", e);
                e
            })?;
        info!(session_id = id, "milking session updated");
        self.reload_after_write().await;
        Ok(())
    }

    pub async fn delete(
        &self,
        id: MilkingSessionId,
        confirmer: &dyn Confirmer,
    ) -> PortResult<SessionDeleteOutcome> {
        if !confirmer.confirm(&ConfirmPrompt::DELETE_MILKING_SESSION).await {
            return Ok(SessionDeleteOutcome::Declined);
        }
        self.sessions_api.delete_milking_session(id).await.map_err(|e| {
            error!(session_id = id, "Failed to delete milking session: {}", e);
            e
        })?;
        info!(session_id = id, "milking session deleted");
        self.reload_after_write().await;
        Ok(SessionDeleteOutcome::Deleted)
    }

    fn resolve_milker(&self, chosen: Option<i64>) -> PortResult<i64> {
        let user = self.context.user();
        match (chosen, user) {
            (Some(id), _) => Ok(id),
            (None, Some(user)) if user.role.is_elevated() => {
                Err(PortError::Validation(MISSING_MILKER.to_string()))
            }
            (None, Some(user)) => Ok(user.user_id.0),
            (None, None) => Err(PortError::Validation(UNKNOWN_MILKER.to_string())),
        }
    }

    /// A write already succeeded; a failed reload only leaves the list stale.
    async fn reload_after_write(&self) {
        match self.sessions_api.get_milking_sessions().await {
            Ok(sessions) => *self.sessions.write().await = sessions,
            Err(e) => warn!("Reload after write failed, keeping previous list: {}", e),
        }
    }

    //=====================================================================================
    // Herd lookups for the forms
    //=====================================================================================

    /// Cows that can be milked by the caller: every female cow for admins,
    /// the caller's female managed cows otherwise.
    pub async fn cow_options(&self) -> PortResult<Vec<Cow>> {
        let cows = if self.context.is_elevated() {
            self.herd.list_cows().await?
        } else {
            self.context.managed_cows()
        };
        Ok(cows.into_iter().filter(Cow::is_female).collect())
    }

    /// Farmers assigned to a cow. Only admins pick milkers, so others get an empty list.
    pub async fn milkers_for_cow(&self, cow_id: CowId) -> Vec<Farmer> {
        if !self.context.is_elevated() {
            return Vec::new();
        }
        match self.herd.get_cow_managers(cow_id).await {
            Ok(managers) => managers,
            Err(e) => {
                error!(cow_id, "Error fetching farmers for cow: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn all_farmers(&self) -> PortResult<Vec<Farmer>> {
        if !self.context.is_elevated() {
            return Ok(Vec::new());
        }
        self.herd.get_all_farmers().await
    }
}

fn check_volume(volume: f64) -> PortResult<()> {
    if volume.is_finite() && volume >= 0.0 {
        Ok(())
    } else {
        Err(PortError::Validation(format!("Invalid milk volume: {}", volume)))
    }
}
