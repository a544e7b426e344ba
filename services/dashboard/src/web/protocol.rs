//! services/dashboard/src/web/protocol.rs
//!
//! Defines the JSON protocol between the browser client and the dashboard:
//! request payloads, query strings, response bodies, and how port errors
//! turn into HTTP statuses.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use dairy_track_core::domain::{Cow, CurrentUser, Farmer, MilkingSessionDraft, MilkingSessionRecord, NotificationRecord};
use dairy_track_core::notification_store::DropdownView;
use dairy_track_core::ports::{ConfirmPrompt, PortError};
use dairy_track_core::session_view::{fixed2, FilterOption, LocalCalendar, VolumeStats};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Errors
//=========================================================================================

/// The body of every non-2xx response.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// A confirmation the client has to show before repeating the request with `confirm=true`.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ConfirmationRequired {
    pub error: String,
    pub title: String,
    pub confirm_label: String,
}

pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn status_for(error: &PortError) -> StatusCode {
    match error {
        PortError::Auth => StatusCode::UNAUTHORIZED,
        PortError::Validation(_) => StatusCode::BAD_REQUEST,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Remote(_) => StatusCode::BAD_GATEWAY,
        PortError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn port_failure(error: PortError) -> HandlerError {
    (
        status_for(&error),
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

pub fn confirmation_required(prompt: &ConfirmPrompt) -> (StatusCode, Json<ConfirmationRequired>) {
    (
        StatusCode::CONFLICT,
        Json(ConfirmationRequired {
            error: prompt.text.to_string(),
            title: prompt.title.to_string(),
            confirm_label: prompt.confirm_label.to_string(),
        }),
    )
}

//=========================================================================================
// Query Strings
//=========================================================================================

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ConfirmParams {
    /// Set once the user has answered "yes" to the confirmation dialog.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct NotificationListParams {
    #[serde(default)]
    pub search: Option<String>,
    /// One of `all`, `unread`, `low`, `high`.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct SessionListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub cow_id: Option<i64>,
    #[serde(default)]
    pub milker_id: Option<i64>,
    /// A local calendar day, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub page: Option<usize>,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct NotificationDto {
    pub id: i64,
    pub message: String,
    /// The wire name of the notification type.
    #[serde(rename = "type")]
    pub kind: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
    /// `created_at` for display, or "Date unknown".
    pub display_time: String,
}

impl From<&NotificationRecord> for NotificationDto {
    fn from(record: &NotificationRecord) -> Self {
        Self {
            id: record.id,
            message: record.message.clone(),
            kind: record.kind.as_wire().to_string(),
            is_read: record.is_read,
            created_at: record.display_time(),
            display_time: record
                .display_time()
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "Date unknown".to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DropdownResponse {
    pub items: Vec<NotificationDto>,
    pub unread_count: usize,
    /// Empty at zero, `9+` above nine.
    pub badge: String,
    /// Whether this open went through the throttle and hit the remote.
    pub refreshed: bool,
    /// The refresh error, if one happened. The cached items are still returned.
    pub refresh_error: Option<String>,
}

impl DropdownResponse {
    pub fn new(view: DropdownView, refreshed: bool, refresh_error: Option<String>) -> Self {
        Self {
            items: view.items.iter().map(NotificationDto::from).collect(),
            unread_count: view.unread_count,
            badge: view.badge,
            refreshed,
            refresh_error,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct NotificationPageResponse {
    pub items: Vec<NotificationDto>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub unread_count: usize,
    pub search: String,
    pub filter: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct MarkReadResponse {
    /// How many records flipped from unread to read.
    pub changed: usize,
    pub unread_count: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DeleteNotificationResponse {
    pub deleted: bool,
    /// Whether the follow-up refresh got through the throttle.
    pub refreshed: bool,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ClearNotificationsResponse {
    pub removed: usize,
}

//=========================================================================================
// Milking Sessions
//=========================================================================================

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone)]
pub struct SessionDraftRequest {
    pub cow_id: i64,
    /// Required for admins; everyone else records as themselves.
    #[serde(default)]
    pub milker_id: Option<i64>,
    pub volume: f64,
    pub milking_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<SessionDraftRequest> for MilkingSessionDraft {
    fn from(request: SessionDraftRequest) -> Self {
        MilkingSessionDraft {
            cow_id: request.cow_id,
            milker_id: request.milker_id,
            volume: request.volume,
            milking_time: request.milking_time,
            notes: request.notes,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SessionDto {
    pub id: i64,
    pub cow_id: i64,
    pub cow_name: Option<String>,
    pub milker_id: i64,
    pub milker_name: Option<String>,
    /// Liters with two decimals.
    pub volume: String,
    pub milking_time: DateTime<Utc>,
    /// Local wall-clock `HH:MM`.
    pub local_time: String,
    /// Morning, Afternoon or Evening.
    pub period: String,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl SessionDto {
    pub fn new(session: &MilkingSessionRecord, calendar: &LocalCalendar) -> Self {
        let (local_time, period) = dairy_track_core::session_view::milking_time_label(calendar, session.milking_time);
        Self {
            id: session.id,
            cow_id: session.cow_id,
            cow_name: session.cow_name.clone(),
            milker_id: session.milker_id,
            milker_name: session.milker_name.clone(),
            volume: fixed2(session.volume),
            milking_time: session.milking_time,
            local_time,
            period: period.label().to_string(),
            notes: session.notes.clone(),
            created_at: session.created_at,
        }
    }
}

/// Volume aggregates, liters with two decimals.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct VolumeStatsDto {
    pub total_volume: String,
    pub session_count: usize,
    pub today_volume: String,
    pub today_sessions: usize,
    pub average_volume: String,
}

impl From<&VolumeStats> for VolumeStatsDto {
    fn from(stats: &VolumeStats) -> Self {
        Self {
            total_volume: fixed2(stats.total_volume),
            session_count: stats.session_count,
            today_volume: fixed2(stats.today_volume),
            today_sessions: stats.today_sessions,
            average_volume: fixed2(stats.average_volume),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct OptionDto {
    pub id: i64,
    pub name: String,
}

impl From<&FilterOption> for OptionDto {
    fn from(option: &FilterOption) -> Self {
        Self {
            id: option.id,
            name: option.name.clone(),
        }
    }
}

impl From<Farmer> for OptionDto {
    fn from(farmer: Farmer) -> Self {
        Self {
            id: farmer.id,
            name: farmer.name,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SessionPageResponse {
    pub items: Vec<SessionDto>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// Everything the caller may see.
    pub stats: VolumeStatsDto,
    /// What survives the active filters.
    pub filtered_stats: VolumeStatsDto,
    pub has_active_filters: bool,
    pub cow_options: Vec<OptionDto>,
    pub milker_options: Vec<OptionDto>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CowOptionDto {
    pub id: i64,
    pub name: String,
    pub gender: Option<String>,
}

impl From<Cow> for CowOptionDto {
    fn from(cow: Cow) -> Self {
        Self {
            id: cow.id,
            name: cow.name,
            gender: cow.gender,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

//=========================================================================================
// Identity
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct MeResponse {
    pub logged_in: bool,
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub is_admin: bool,
    pub managed_cow_count: usize,
}

impl MeResponse {
    pub fn new(user: Option<&CurrentUser>, managed_cow_count: usize) -> Self {
        Self {
            logged_in: user.is_some(),
            user_id: user.map(|u| u.user_id.0),
            role: user.map(|u| u.role.label().to_string()),
            name: user.map(|u| u.display_name().to_string()),
            is_admin: user.is_some_and(|u| u.role.is_elevated()),
            managed_cow_count,
        }
    }
}
