//! services/dashboard/src/web/rest.rs
//!
//! Contains the identity and export handlers and the master definition for
//! the OpenAPI specification.

use crate::web::protocol::{
    ClearNotificationsResponse, ConfirmationRequired, CowOptionDto, DeleteNotificationResponse,
    DropdownResponse, ErrorBody, MarkReadResponse, MeResponse, MessageResponse, NotificationDto,
    NotificationPageResponse, OptionDto, SessionDraftRequest, SessionDto, SessionPageResponse,
    VolumeStatsDto,
};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use dairy_track_core::ports::ExportService;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        me_handler,
        crate::web::notifications::dropdown_handler,
        crate::web::notifications::list_notifications_handler,
        crate::web::notifications::mark_read_handler,
        crate::web::notifications::mark_all_read_handler,
        crate::web::notifications::delete_notification_handler,
        crate::web::notifications::clear_notifications_handler,
        crate::web::milking::list_sessions_handler,
        crate::web::milking::add_session_handler,
        crate::web::milking::edit_session_handler,
        crate::web::milking::delete_session_handler,
        crate::web::milking::cow_options_handler,
        crate::web::milking::cow_milkers_handler,
        crate::web::milking::farmers_handler,
        export_pdf_handler,
        export_excel_handler,
    ),
    components(
        schemas(
            ErrorBody, ConfirmationRequired, MeResponse, MessageResponse,
            NotificationDto, DropdownResponse, NotificationPageResponse, MarkReadResponse,
            DeleteNotificationResponse, ClearNotificationsResponse,
            SessionDraftRequest, SessionDto, VolumeStatsDto, SessionPageResponse,
            OptionDto, CowOptionDto
        )
    ),
    tags(
        (name = "dairyTrack Dashboard API", description = "Notifications and milking sessions for the logged-in dairy user.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Identity
//=========================================================================================

/// Who the dashboard is running as.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The current user, or an anonymous marker", body = MeResponse)
    )
)]
pub async fn me_handler(State(state): State<Arc<AppState>>) -> Json<MeResponse> {
    Json(MeResponse::new(
        state.context.user(),
        state.context.managed_cows().len(),
    ))
}

//=========================================================================================
// Exports
//=========================================================================================

/// Ask the remote to produce the milk production PDF.
///
/// The export runs in the background; the response only acknowledges the request.
#[utoipa::path(
    post,
    path = "/exports/pdf",
    responses(
        (status = 202, description = "Export requested", body = MessageResponse)
    )
)]
pub async fn export_pdf_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    spawn_export(state.exports.clone(), ExportKind::Pdf);
    (StatusCode::ACCEPTED, Json(MessageResponse::new("PDF export requested")))
}

#[utoipa::path(
    post,
    path = "/exports/excel",
    responses(
        (status = 202, description = "Export requested", body = MessageResponse)
    )
)]
pub async fn export_excel_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    spawn_export(state.exports.clone(), ExportKind::Excel);
    (StatusCode::ACCEPTED, Json(MessageResponse::new("Excel export requested")))
}

#[derive(Debug, Clone, Copy)]
enum ExportKind {
    Pdf,
    Excel,
}

fn spawn_export(exports: Arc<dyn ExportService>, kind: ExportKind) {
    tokio::spawn(async move {
        let result = match kind {
            ExportKind::Pdf => exports.export_pdf().await,
            ExportKind::Excel => exports.export_excel().await,
        };
        match result {
            Ok(()) => info!(?kind, "export finished"),
            Err(e) => error!(?kind, "Export failed: {}", e),
        }
    });
}
