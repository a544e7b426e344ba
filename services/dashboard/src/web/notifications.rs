//! services/dashboard/src/web/notifications.rs
//!
//! Handlers for the notification bell, the "view all" panel and its mutations.

use crate::web::protocol::{
    confirmation_required, port_failure, ClearNotificationsResponse, ConfirmParams,
    ConfirmationRequired, DeleteNotificationResponse, DropdownResponse, ErrorBody, HandlerError,
    MarkReadResponse, NotificationDto, NotificationListParams, NotificationPageResponse,
};
use crate::web::state::{AppState, QueryConfirmer};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use dairy_track_core::notification_store::{ClearOutcome, DeleteOutcome, RefreshOutcome};
use dairy_track_core::notification_view::NotificationFilter;
use dairy_track_core::ports::ConfirmPrompt;
use std::sync::Arc;
use tracing::info;

/// Open the notification dropdown.
///
/// Refreshes from the remote when the throttle allows it, then returns the
/// five most recent notifications and the unread badge.
#[utoipa::path(
    get,
    path = "/notifications/dropdown",
    responses(
        (status = 200, description = "The dropdown contents", body = DropdownResponse)
    )
)]
pub async fn dropdown_handler(State(state): State<Arc<AppState>>) -> Json<DropdownResponse> {
    let (view, outcome) = state.notifications.open_dropdown().await;
    let (refreshed, refresh_error) = match outcome {
        RefreshOutcome::Skipped => (false, None),
        RefreshOutcome::Fetched(Ok(_)) => (true, None),
        RefreshOutcome::Fetched(Err(e)) => (true, Some(e.to_string())),
    };
    Json(DropdownResponse::new(view, refreshed, refresh_error))
}

/// One page of the "view all" panel.
///
/// Changing the search term or filter, or new records arriving, sends the panel
/// back to page 1; `page` is honoured only when none of those changed.
#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationListParams),
    responses(
        (status = 200, description = "A page of notifications", body = NotificationPageResponse),
        (status = 400, description = "Unknown filter", body = ErrorBody)
    )
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationListParams>,
) -> Result<Json<NotificationPageResponse>, HandlerError> {
    let filter = params
        .filter
        .as_deref()
        .unwrap_or("")
        .parse::<NotificationFilter>()
        .map_err(port_failure)?;
    let search = params.search.unwrap_or_default();

    state.notifications.set_panel_open(true).await;
    let records = state.notifications.records().await;
    let version = state.notifications.version().await;
    let unread_count = state.notifications.unread_count().await;

    let mut browser = state.browser.lock().await;
    let reset = browser.sync(version, &search, filter);
    if let (false, Some(page)) = (reset, params.page) {
        browser.go_to_page(page);
    }
    let page = browser.view(&records);

    Ok(Json(NotificationPageResponse {
        items: page.items.iter().map(NotificationDto::from).collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_items: page.total_items,
        unread_count,
        search: browser.query().search_term.clone(),
        filter: browser.query().filter.as_str().to_string(),
    }))
}

/// Mark one notification read. Unknown or already-read ids change nothing.
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked", body = MarkReadResponse)
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<MarkReadResponse> {
    let changed = state.notifications.mark_as_read(id).await;
    Json(MarkReadResponse {
        changed: usize::from(changed),
        unread_count: state.notifications.unread_count().await,
    })
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "Every cached notification marked read", body = MarkReadResponse)
    )
)]
pub async fn mark_all_read_handler(State(state): State<Arc<AppState>>) -> Json<MarkReadResponse> {
    let changed = state.notifications.mark_all_as_read().await;
    Json(MarkReadResponse {
        changed,
        unread_count: state.notifications.unread_count().await,
    })
}

/// Delete one notification on the remote.
///
/// Without `confirm=true` nothing happens and the confirmation text comes back with 409.
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = i64, Path, description = "Notification id"), ConfirmParams),
    responses(
        (status = 200, description = "Deleted", body = DeleteNotificationResponse),
        (status = 401, description = "No logged-in user", body = ErrorBody),
        (status = 409, description = "Confirmation required", body = ConfirmationRequired),
        (status = 502, description = "The remote refused", body = ErrorBody),
        (status = 503, description = "The remote is unreachable", body = ErrorBody)
    )
)]
pub async fn delete_notification_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ConfirmParams>,
) -> Result<Response, HandlerError> {
    let confirmer = QueryConfirmer::new(params.confirm);
    let outcome = state
        .notifications
        .delete_one(id, state.context.user_id(), &confirmer)
        .await
        .map_err(port_failure)?;

    Ok(match outcome {
        DeleteOutcome::Deleted { refreshed } => Json(DeleteNotificationResponse {
            deleted: true,
            refreshed,
        })
        .into_response(),
        DeleteOutcome::Declined => confirmation_required(&ConfirmPrompt::DELETE_NOTIFICATION).into_response(),
    })
}

/// Clear the local notification list and close the panel.
#[utoipa::path(
    delete,
    path = "/notifications",
    params(ConfirmParams),
    responses(
        (status = 200, description = "Cleared", body = ClearNotificationsResponse),
        (status = 409, description = "Confirmation required", body = ConfirmationRequired)
    )
)]
pub async fn clear_notifications_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
) -> Response {
    let confirmer = QueryConfirmer::new(params.confirm);
    match state.notifications.clear_all(&confirmer).await {
        ClearOutcome::Cleared { removed } => {
            info!(removed, "notification panel cleared");
            (StatusCode::OK, Json(ClearNotificationsResponse { removed })).into_response()
        }
        ClearOutcome::Declined => confirmation_required(&ConfirmPrompt::CLEAR_NOTIFICATIONS).into_response(),
    }
}
