//! crates/dairy_track_core/src/context.rs
//!
//! The explicitly constructed session context. It is created once when the
//! dashboard starts (from the persisted user descriptor) and dropped at
//! logout or reload. Stores and views receive it instead of reading any
//! process-wide state.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::{Cow, CowId, CurrentUser, Role, UserId};

/// Which sessions the caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionScope {
    /// The elevated role sees everything.
    All,
    /// Everyone else sees only the cows they manage.
    ManagedCows(HashSet<CowId>),
}

impl SessionScope {
    pub fn allows(&self, cow_id: CowId) -> bool {
        match self {
            SessionScope::All => true,
            SessionScope::ManagedCows(ids) => ids.contains(&cow_id),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    user: Option<CurrentUser>,
    managed_cows: RwLock<Vec<Cow>>,
}

impl SessionContext {
    pub fn new(user: Option<CurrentUser>) -> Self {
        Self {
            user,
            managed_cows: RwLock::new(Vec::new()),
        }
    }

    /// A context with no logged-in user.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.user_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_elevated(&self) -> bool {
        self.role().is_some_and(Role::is_elevated)
    }

    /// Replaces the cows the current user manages.
    pub fn set_managed_cows(&self, cows: Vec<Cow>) {
        let mut guard = self
            .managed_cows
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = cows;
    }

    pub fn managed_cows(&self) -> Vec<Cow> {
        self.managed_cows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn scope(&self) -> SessionScope {
        if self.is_elevated() {
            return SessionScope::All;
        }
        let ids = self.managed_cows().into_iter().map(|c| c.id).collect();
        SessionScope::ManagedCows(ids)
    }
}
