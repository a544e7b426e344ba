//! services/dashboard/src/web/milking.rs
//!
//! Handlers for the milking session table, its forms and the herd lookups behind them.

use crate::web::protocol::{
    confirmation_required, port_failure, ConfirmParams, ConfirmationRequired, CowOptionDto,
    ErrorBody, HandlerError, MessageResponse, OptionDto, SessionDraftRequest, SessionDto,
    SessionListParams, SessionPageResponse, VolumeStatsDto,
};
use crate::web::state::{AppState, QueryConfirmer};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use dairy_track_core::milking_book::SessionDeleteOutcome;
use dairy_track_core::ports::ConfirmPrompt;
use dairy_track_core::session_view::{SessionFilters, SessionQuery};
use std::sync::Arc;

/// The caller's milking sessions, newest first, filtered and paginated.
#[utoipa::path(
    get,
    path = "/milking-sessions",
    params(SessionListParams),
    responses(
        (status = 200, description = "A page of sessions with volume stats", body = SessionPageResponse)
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionListParams>,
) -> Json<SessionPageResponse> {
    let query = SessionQuery {
        filters: SessionFilters {
            search_term: params.search.unwrap_or_default(),
            cow_id: params.cow_id,
            milker_id: params.milker_id,
            date: params.date,
        },
        page: params.page.unwrap_or(1),
        ..SessionQuery::default()
    };
    let calendar = state.calendar();
    let projection = state.milking.project(&query, &calendar).await;

    Json(SessionPageResponse {
        items: projection.items.iter().map(|s| SessionDto::new(s, &calendar)).collect(),
        page: projection.page,
        total_pages: projection.total_pages,
        total_items: projection.total_items,
        stats: VolumeStatsDto::from(&projection.base),
        filtered_stats: VolumeStatsDto::from(&projection.filtered),
        has_active_filters: projection.has_active_filters,
        cow_options: projection.cow_options.iter().map(OptionDto::from).collect(),
        milker_options: projection.milker_options.iter().map(OptionDto::from).collect(),
    })
}

/// Record a new milking session.
///
/// The creator line is appended to the notes. Admins must name the milker.
#[utoipa::path(
    post,
    path = "/milking-sessions",
    request_body = SessionDraftRequest,
    responses(
        (status = 201, description = "Recorded", body = MessageResponse),
        (status = 400, description = "Invalid draft", body = ErrorBody),
        (status = 502, description = "The remote refused", body = ErrorBody),
        (status = 503, description = "The remote is unreachable", body = ErrorBody)
    )
)]
pub async fn add_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SessionDraftRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    state.milking.add(request.into()).await.map_err(port_failure)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Milking session added successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/milking-sessions/{id}",
    params(("id" = i64, Path, description = "Milking session id")),
    request_body = SessionDraftRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 400, description = "Invalid draft", body = ErrorBody),
        (status = 404, description = "No such session on the remote", body = ErrorBody),
        (status = 502, description = "The remote refused", body = ErrorBody),
        (status = 503, description = "The remote is unreachable", body = ErrorBody)
    )
)]
pub async fn edit_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<SessionDraftRequest>,
) -> Result<Json<MessageResponse>, HandlerError> {
    state.milking.edit(id, request.into()).await.map_err(port_failure)?;
    Ok(Json(MessageResponse::new("Milking session updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/milking-sessions/{id}",
    params(("id" = i64, Path, description = "Milking session id"), ConfirmParams),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "No such session on the remote", body = ErrorBody),
        (status = 409, description = "Confirmation required", body = ConfirmationRequired),
        (status = 502, description = "The remote refused", body = ErrorBody),
        (status = 503, description = "The remote is unreachable", body = ErrorBody)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ConfirmParams>,
) -> Result<Response, HandlerError> {
    let confirmer = QueryConfirmer::new(params.confirm);
    let outcome = state.milking.delete(id, &confirmer).await.map_err(port_failure)?;
    Ok(match outcome {
        SessionDeleteOutcome::Deleted => {
            Json(MessageResponse::new("Milking session has been deleted")).into_response()
        }
        SessionDeleteOutcome::Declined => {
            confirmation_required(&ConfirmPrompt::DELETE_MILKING_SESSION).into_response()
        }
    })
}

/// Cows the caller may record a session for.
#[utoipa::path(
    get,
    path = "/cows/options",
    responses(
        (status = 200, description = "Female cows available to the caller", body = [CowOptionDto]),
        (status = 502, description = "The remote refused", body = ErrorBody)
    )
)]
pub async fn cow_options_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CowOptionDto>>, HandlerError> {
    let cows = state.milking.cow_options().await.map_err(port_failure)?;
    Ok(Json(cows.into_iter().map(CowOptionDto::from).collect()))
}

/// Farmers assigned to a cow. Empty for anyone but an admin.
#[utoipa::path(
    get,
    path = "/cows/{id}/milkers",
    params(("id" = i64, Path, description = "Cow id")),
    responses(
        (status = 200, description = "Milkers for the cow", body = [OptionDto])
    )
)]
pub async fn cow_milkers_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<Vec<OptionDto>> {
    let milkers = state.milking.milkers_for_cow(id).await;
    Json(milkers.into_iter().map(OptionDto::from).collect())
}

/// Every farmer account. Empty for anyone but an admin.
#[utoipa::path(
    get,
    path = "/farmers",
    responses(
        (status = 200, description = "All farmers", body = [OptionDto]),
        (status = 502, description = "The remote refused", body = ErrorBody)
    )
)]
pub async fn farmers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OptionDto>>, HandlerError> {
    let farmers = state.milking.all_farmers().await.map_err(port_failure)?;
    Ok(Json(farmers.into_iter().map(OptionDto::from).collect()))
}
