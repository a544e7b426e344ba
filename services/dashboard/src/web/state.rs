//! services/dashboard/src/web/state.rs
//!
//! Defines the application's shared state and the confirmation bridge.

use crate::config::Config;
use async_trait::async_trait;
use dairy_track_core::ports::{ConfirmPrompt, Confirmer, ExportService};
use dairy_track_core::session_view::LocalCalendar;
use dairy_track_core::{MilkingSessionBook, NotificationBrowser, NotificationStore, SessionContext};
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// One dashboard process serves one logged-in user, so the stores live here
/// rather than per request.
pub struct AppState {
    pub config: Arc<Config>,
    pub context: Arc<SessionContext>,
    pub notifications: NotificationStore,
    /// The "view all" panel's page and filters.
    pub browser: Mutex<NotificationBrowser>,
    pub milking: Arc<MilkingSessionBook>,
    pub exports: Arc<dyn ExportService>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        context: Arc<SessionContext>,
        notifications: NotificationStore,
        milking: Arc<MilkingSessionBook>,
        exports: Arc<dyn ExportService>,
    ) -> Self {
        Self {
            config,
            context,
            notifications,
            browser: Mutex::new(NotificationBrowser::new()),
            milking,
            exports,
        }
    }

    /// The dashboard's calendar as of this moment.
    pub fn calendar(&self) -> LocalCalendar {
        LocalCalendar::now(self.config.utc_offset)
    }
}

//=========================================================================================
// Confirmation over HTTP
//=========================================================================================

/// Answers a confirmation with what the client already sent.
///
/// A browser shows the dialog itself and repeats the request with
/// `confirm=true`; anything else counts as a "no".
#[derive(Debug, Clone, Copy)]
pub struct QueryConfirmer {
    pub confirmed: bool,
}

impl QueryConfirmer {
    pub fn new(confirmed: bool) -> Self {
        Self { confirmed }
    }
}

#[async_trait]
impl Confirmer for QueryConfirmer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.confirmed
    }
}
