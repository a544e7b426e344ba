pub mod middleware;
pub mod milking;
pub mod notifications;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::request_id;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the API router over the shared state.
///
/// CORS and the Swagger UI are layered on by the binary.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(rest::me_handler))
        .route(
            "/notifications",
            get(notifications::list_notifications_handler).delete(notifications::clear_notifications_handler),
        )
        .route("/notifications/dropdown", get(notifications::dropdown_handler))
        .route("/notifications/read-all", post(notifications::mark_all_read_handler))
        .route("/notifications/{id}/read", post(notifications::mark_read_handler))
        .route("/notifications/{id}", delete(notifications::delete_notification_handler))
        .route(
            "/milking-sessions",
            get(milking::list_sessions_handler).post(milking::add_session_handler),
        )
        .route(
            "/milking-sessions/{id}",
            put(milking::edit_session_handler).delete(milking::delete_session_handler),
        )
        .route("/cows/options", get(milking::cow_options_handler))
        .route("/cows/{id}/milkers", get(milking::cow_milkers_handler))
        .route("/farmers", get(milking::farmers_handler))
        .route("/exports/pdf", post(rest::export_pdf_handler))
        .route("/exports/excel", post(rest::export_excel_handler))
        .layer(axum_middleware::from_fn(request_id))
        .with_state(app_state)
}
