//! crates/dairy_track_core/src/ports.rs
//!
//! Defines the service contracts (traits) the dashboard core depends on.
//! The remote dairyTrack API, the confirmation dialog and the export triggers
//! are all external collaborators; the core only sees these ports.

use async_trait::async_trait;
use crate::domain::{
    Cow, CowId, Farmer, MilkingSessionDraft, MilkingSessionId, MilkingSessionRecord,
    NotificationFeed, NotificationId, UserId,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every dashboard operation.
///
/// All of these are caught at the operation boundary and shown to the user;
/// none of them are fatal to the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// A mutating operation was attempted without a user identity.
    #[error("You must be logged in to perform this action")]
    Auth,
    /// The remote answered with a non-success response. The message is passed through verbatim.
    #[error("{0}")]
    Remote(String),
    /// The remote call itself failed (connection refused, bad payload, ...).
    #[error("Network error: {0}")]
    Network(String),
    /// Local input was rejected before any remote call.
    #[error("{0}")]
    Validation(String),
    /// The remote answered 404 for the addressed record.
    #[error("{0}")]
    NotFound(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Confirmation
//=========================================================================================

/// The text of a yes/no question put to the user before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: &'static str,
    pub text: &'static str,
    pub confirm_label: &'static str,
}

impl ConfirmPrompt {
    pub const DELETE_NOTIFICATION: ConfirmPrompt = ConfirmPrompt {
        title: "Confirm Delete",
        text: "Are you sure you want to delete this notification?",
        confirm_label: "Delete",
    };

    pub const CLEAR_NOTIFICATIONS: ConfirmPrompt = ConfirmPrompt {
        title: "Clear All Notifications?",
        text: "This action cannot be undone",
        confirm_label: "Yes, clear them",
    };

    pub const DELETE_MILKING_SESSION: ConfirmPrompt = ConfirmPrompt {
        title: "Delete Milking Session?",
        text: "You won't be able to revert this!",
        confirm_label: "Yes, delete it!",
    };
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Asks the user and resolves to `true` only on an explicit yes.
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Fetches every notification visible to the current user.
    async fn fetch_notifications(&self) -> PortResult<NotificationFeed>;

    async fn delete_notification(&self, id: NotificationId, user_id: UserId) -> PortResult<()>;

    /// Marks a notification read on the remote. The store never awaits this on the user's path.
    async fn mark_notification_read(&self, id: NotificationId) -> PortResult<()>;
}

#[async_trait]
pub trait MilkingSessionService: Send + Sync {
    async fn get_milking_sessions(&self) -> PortResult<Vec<MilkingSessionRecord>>;

    async fn add_milking_session(&self, draft: &MilkingSessionDraft) -> PortResult<()>;

    async fn edit_milking_session(
        &self,
        id: MilkingSessionId,
        draft: &MilkingSessionDraft,
    ) -> PortResult<()>;

    async fn delete_milking_session(&self, id: MilkingSessionId) -> PortResult<()>;
}

#[async_trait]
pub trait HerdDirectory: Send + Sync {
    async fn list_cows(&self) -> PortResult<Vec<Cow>>;

    /// The cows the given user manages.
    async fn list_cows_by_user(&self, user_id: UserId) -> PortResult<Vec<Cow>>;

    /// The farmers assigned to a cow.
    async fn get_cow_managers(&self, cow_id: CowId) -> PortResult<Vec<Farmer>>;

    async fn get_all_farmers(&self) -> PortResult<Vec<Farmer>>;
}

#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export_pdf(&self) -> PortResult<()>;

    async fn export_excel(&self) -> PortResult<()>;
}
