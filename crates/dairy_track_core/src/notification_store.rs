//! crates/dairy_track_core/src/notification_store.rs
//!
//! The authoritative in-memory copy of the current user's notifications.
//!
//! The remote service is the source of truth. The store replaces its records
//! wholesale on every applied fetch, mutates them locally for read-state,
//! and never lets a failed remote call leave it half-updated.

use futures::FutureExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::domain::{NotificationId, NotificationRecord, UserId};
use crate::ports::{ConfirmPrompt, Confirmer, NotificationService, PortError, PortResult};
use crate::single_flight::SingleFlight;
use crate::throttle::{FetchThrottle, FetchTrigger};

/// How many records the live dropdown shows.
pub const DROPDOWN_LIMIT: usize = 5;

const FETCH_KEY: &str = "fetch_notifications";

type FetchResult = PortResult<Vec<NotificationRecord>>;

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<NotificationRecord>,
    /// Sequence number of the newest fetch whose result was applied.
    applied_seq: u64,
    /// Bumped on every change to `records`.
    version: u64,
    panel_open: bool,
}

impl StoreState {
    fn replace(&mut self, seq: u64, records: Vec<NotificationRecord>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.records = records;
        self.version += 1;
        true
    }

    fn unread_count(&self) -> usize {
        self.records.iter().filter(|n| !n.is_read).count()
    }
}

/// What a throttled refresh ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The gate refused; the cached records are still current.
    Skipped,
    Fetched(FetchResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Removed remotely. `refreshed` tells whether the follow-up fetch got through the gate.
    Deleted { refreshed: bool },
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared { removed: usize },
    Declined,
}

/// The data behind the bell icon.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownView {
    pub items: Vec<NotificationRecord>,
    pub unread_count: usize,
    pub badge: String,
}

/// The label on the unread badge: empty at zero, capped at "9+".
pub fn badge_label(unread_count: usize) -> String {
    match unread_count {
        0 => String::new(),
        1..=9 => unread_count.to_string(),
        _ => "9+".to_string(),
    }
}

#[derive(Clone)]
pub struct NotificationStore {
    service: Arc<dyn NotificationService>,
    throttle: Arc<FetchThrottle>,
    flights: Arc<SingleFlight<&'static str, FetchResult>>,
    state: Arc<RwLock<StoreState>>,
    next_seq: Arc<AtomicU64>,
}

impl NotificationStore {
    pub fn new(service: Arc<dyn NotificationService>) -> Self {
        Self {
            service,
            throttle: Arc::new(FetchThrottle::new()),
            flights: Arc::new(SingleFlight::new()),
            state: Arc::new(RwLock::new(StoreState::default())),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    //=====================================================================================
    // Reads
    //=====================================================================================

    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.state.read().await.records.clone()
    }

    /// Always equal to the number of records with `is_read == false`.
    pub async fn unread_count(&self) -> usize {
        self.state.read().await.unread_count()
    }

    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    pub async fn dropdown(&self) -> DropdownView {
        let state = self.state.read().await;
        let unread_count = state.unread_count();
        DropdownView {
            items: state.records.iter().take(DROPDOWN_LIMIT).cloned().collect(),
            unread_count,
            badge: badge_label(unread_count),
        }
    }

    pub async fn is_panel_open(&self) -> bool {
        self.state.read().await.panel_open
    }

    pub async fn set_panel_open(&self, open: bool) {
        self.state.write().await.panel_open = open;
    }

    //=====================================================================================
    // Fetching
    //=====================================================================================

    /// Replaces the local records with the remote ones.
    ///
    /// Concurrent callers share one request. On failure the local records are
    /// untouched and the error is returned for display.
    pub async fn fetch_all(&self) -> FetchResult {
        let this = self.clone();
        self.flights
            .run(FETCH_KEY, move || async move { this.fetch_once().await }.boxed())
            .await
    }

    async fn fetch_once(&self) -> FetchResult {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        match self.service.fetch_notifications().await {
            Ok(feed) => {
                let mut state = self.state.write().await;
                let reported_unread = feed.unread_count;
                if state.replace(seq, feed.records) {
                    let unread = state.unread_count();
                    if unread != reported_unread {
                        debug!(unread, reported_unread, "remote unread count differs from records");
                    }
                    info!(count = state.records.len(), unread, "notifications fetched");
                } else {
                    debug!(seq, applied = state.applied_seq, "discarding stale notification fetch");
                }
                Ok(state.records.clone())
            }
            Err(e) => {
                warn!("Failed to fetch notifications: {}", e);
                Err(e)
            }
        }
    }

    /// Fetches through the cooldown gate for the given trigger.
    pub async fn refresh(&self, trigger: FetchTrigger) -> RefreshOutcome {
        let records_empty = self.state.read().await.records.is_empty();
        let Some(permit) = self.throttle.try_acquire(trigger.min_interval(), records_empty) else {
            debug!(?trigger, "notification refresh skipped");
            return RefreshOutcome::Skipped;
        };

        let result = self.fetch_all().await;
        self.throttle.release_after(permit, trigger.cooldown());
        RefreshOutcome::Fetched(result)
    }

    /// The first fetch after the session starts. Does nothing without an identity.
    pub async fn initial_load(&self, user_id: Option<UserId>) -> RefreshOutcome {
        match user_id {
            Some(user_id) => {
                info!(%user_id, "initial notification fetch");
                self.refresh(FetchTrigger::InitialLoad).await
            }
            None => RefreshOutcome::Skipped,
        }
    }

    /// Opening the bell: refresh if the gate allows, then show the top of the list.
    pub async fn open_dropdown(&self) -> (DropdownView, RefreshOutcome) {
        let outcome = self.refresh(FetchTrigger::DropdownOpen).await;
        (self.dropdown().await, outcome)
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    /// Marks one record read locally and tells the remote in the background.
    ///
    /// Idempotent; unknown ids are ignored. Returns whether a record changed.
    pub async fn mark_as_read(&self, id: NotificationId) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            let changed = match state.records.iter_mut().find(|n| n.id == id) {
                Some(record) if !record.is_read => {
                    record.is_read = true;
                    true
                }
                _ => false,
            };
            if changed {
                state.version += 1;
            }
            changed
        };

        if changed {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Err(e) = service.mark_notification_read(id).await {
                    warn!(notification_id = id, "Failed to mark notification read remotely: {}", e);
                }
            });
        }
        changed
    }

    /// Marks every currently unread record read, one by one. Returns how many changed.
    pub async fn mark_all_as_read(&self) -> usize {
        let unread: Vec<NotificationId> = {
            let state = self.state.read().await;
            state.records.iter().filter(|n| !n.is_read).map(|n| n.id).collect()
        };

        let mut changed = 0;
        for id in unread {
            if self.mark_as_read(id).await {
                changed += 1;
            }
        }
        changed
    }

    /// Deletes one notification on the remote after the user confirms.
    ///
    /// Fails with `PortError::Auth` before anything else when there is no user.
    /// On success a throttled refresh brings the local list back in line.
    pub async fn delete_one(
        &self,
        id: NotificationId,
        user_id: Option<UserId>,
        confirmer: &dyn Confirmer,
    ) -> PortResult<DeleteOutcome> {
        let user_id = user_id.ok_or(PortError::Auth)?;

        if !confirmer.confirm(&ConfirmPrompt::DELETE_NOTIFICATION).await {
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(e) = self.service.delete_notification(id, user_id).await {
            error!(notification_id = id, "Failed to delete notification: {}", e);
            return Err(e);
        }
        info!(notification_id = id, %user_id, "notification deleted");

        let refreshed = match self.refresh(FetchTrigger::PostMutation).await {
            RefreshOutcome::Skipped => false,
            RefreshOutcome::Fetched(result) => {
                if let Err(e) = result {
                    warn!("Refresh after delete failed: {}", e);
                }
                true
            }
        };
        Ok(DeleteOutcome::Deleted { refreshed })
    }

    /// Drops every cached record and closes the "view all" panel after the user confirms.
    ///
    /// Only the local cache is touched; nothing is deleted on the remote.
    pub async fn clear_all(&self, confirmer: &dyn Confirmer) -> ClearOutcome {
        if !confirmer.confirm(&ConfirmPrompt::CLEAR_NOTIFICATIONS).await {
            return ClearOutcome::Declined;
        }

        let mut state = self.state.write().await;
        let removed = state.records.len();
        state.records.clear();
        state.version += 1;
        state.panel_open = false;
        info!(removed, "notifications cleared locally");
        ClearOutcome::Cleared { removed }
    }
}
