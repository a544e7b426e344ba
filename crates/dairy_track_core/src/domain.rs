//! crates/dairy_track_core/src/domain.rs
//!
//! Defines the pure, core data structures for the dashboard.
//! These structs are independent of any wire or storage format; adapters
//! translate their own records into these types at the boundary.

use chrono::{DateTime, Utc};
use std::fmt;

/// Identifier of a notification as assigned by the remote service.
pub type NotificationId = i64;

/// Identifier of a milking session as assigned by the remote service.
pub type MilkingSessionId = i64;

/// Identifier of a cow.
pub type CowId = i64;

//=========================================================================================
// Identity
//=========================================================================================

/// The single canonical identity of a dashboard user.
///
/// The persisted descriptor carries either `id` or `user_id` depending on the
/// role that created it; both collapse into this type at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The access role of a dashboard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The elevated role (`role_id == 1`). Sees every cow and session.
    Admin,
    Supervisor,
    Farmer,
}

impl Role {
    pub fn from_role_id(role_id: i64) -> Self {
        match role_id {
            1 => Role::Admin,
            2 => Role::Supervisor,
            _ => Role::Farmer,
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Supervisor => "Supervisor",
            Role::Farmer => "Farmer",
        }
    }
}

/// A logged-in user after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub role: Role,
    pub name: Option<String>,
    pub username: Option<String>,
}

impl CurrentUser {
    /// Normalizes the raw descriptor fields into a `CurrentUser`.
    ///
    /// `user_id` wins over `id`. Returns `None` when neither is present.
    pub fn from_descriptor(
        id: Option<i64>,
        user_id: Option<i64>,
        role_id: Option<i64>,
        name: Option<String>,
        username: Option<String>,
    ) -> Option<Self> {
        let user_id = user_id.or(id)?;
        Some(Self {
            user_id: UserId(user_id),
            // A descriptor without a role is never treated as elevated.
            role: role_id.map(Role::from_role_id).unwrap_or(Role::Farmer),
            name: name.filter(|n| !n.trim().is_empty()),
            username: username.filter(|n| !n.trim().is_empty()),
        })
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("Unknown")
    }
}

//=========================================================================================
// Notifications
//=========================================================================================

/// The kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    MilkExpiry,
    MilkWarning,
    MilkUsed,
    LowProduction,
    HighProduction,
    Other,
}

impl NotificationType {
    /// Parses the wire name. Anything unrecognised is `Other`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "milk_expiry" => NotificationType::MilkExpiry,
            "milk_warning" => NotificationType::MilkWarning,
            "milk_used" => NotificationType::MilkUsed,
            "low_production" => NotificationType::LowProduction,
            "high_production" => NotificationType::HighProduction,
            _ => NotificationType::Other,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            NotificationType::MilkExpiry => "milk_expiry",
            NotificationType::MilkWarning => "milk_warning",
            NotificationType::MilkUsed => "milk_used",
            NotificationType::LowProduction => "low_production",
            NotificationType::HighProduction => "high_production",
            NotificationType::Other => "other",
        }
    }
}

/// A single notification delivered to the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationType,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
    /// Timezone-local variant sent by the remote; used when `created_at` is absent.
    pub created_at_wib: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    pub fn display_time(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.created_at_wib)
    }
}

/// The result of one remote notification fetch.
#[derive(Debug, Clone, Default)]
pub struct NotificationFeed {
    pub records: Vec<NotificationRecord>,
    /// The unread count as reported by the remote. The store recomputes its own.
    pub unread_count: usize,
}

//=========================================================================================
// Milking sessions and herd
//=========================================================================================

/// A recorded milking of one cow by one milker.
#[derive(Debug, Clone, PartialEq)]
pub struct MilkingSessionRecord {
    pub id: MilkingSessionId,
    pub cow_id: CowId,
    pub cow_name: Option<String>,
    pub milker_id: i64,
    pub milker_name: Option<String>,
    /// Liters, never negative.
    pub volume: f64,
    pub milking_time: DateTime<Utc>,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// The payload for creating or editing a milking session.
#[derive(Debug, Clone, PartialEq)]
pub struct MilkingSessionDraft {
    pub cow_id: CowId,
    /// `None` lets the book pick the caller for non-admin roles.
    pub milker_id: Option<i64>,
    pub volume: f64,
    pub milking_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A cow as listed by the herd directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Cow {
    pub id: CowId,
    pub name: String,
    pub gender: Option<String>,
}

impl Cow {
    pub fn is_female(&self) -> bool {
        self.gender
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case("female"))
    }
}

/// A farmer (milker) account.
#[derive(Debug, Clone, PartialEq)]
pub struct Farmer {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_prefers_user_id_over_id() {
        let user = CurrentUser::from_descriptor(Some(4), Some(9), Some(3), None, None).unwrap();
        assert_eq!(user.user_id, UserId(9));
        assert_eq!(user.role, Role::Farmer);
    }

    #[test]
    fn descriptor_falls_back_to_id() {
        let user =
            CurrentUser::from_descriptor(Some(4), None, Some(1), Some("Sari".into()), None).unwrap();
        assert_eq!(user.user_id, UserId(4));
        assert!(user.role.is_elevated());
        assert_eq!(user.display_name(), "Sari");
    }

    #[test]
    fn descriptor_without_identity_is_anonymous() {
        assert!(CurrentUser::from_descriptor(None, None, Some(1), None, None).is_none());
    }

    #[test]
    fn unknown_notification_type_is_other() {
        assert_eq!(NotificationType::from_wire("stock_alert"), NotificationType::Other);
        assert_eq!(
            NotificationType::from_wire("low_production"),
            NotificationType::LowProduction
        );
    }

    #[test]
    fn display_time_falls_back_to_wib() {
        let wib = "2025-05-01T10:00:00Z".parse().unwrap();
        let record = NotificationRecord {
            id: 1,
            message: "x".into(),
            kind: NotificationType::Other,
            is_read: false,
            created_at: None,
            created_at_wib: Some(wib),
        };
        assert_eq!(record.display_time(), Some(wib));
    }
}
