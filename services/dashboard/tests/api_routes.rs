//! Exercises the HTTP surface against in-memory ports.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use dairy_track_core::domain::{
    Cow, CowId, CurrentUser, Farmer, MilkingSessionDraft, MilkingSessionId, MilkingSessionRecord,
    NotificationFeed, NotificationId, NotificationRecord, NotificationType, UserId,
};
use dairy_track_core::ports::{
    ExportService, HerdDirectory, MilkingSessionService, NotificationService, PortError, PortResult,
};
use dairy_track_core::{MilkingSessionBook, NotificationStore, SessionContext};
use dashboard_lib::config::Config;
use dashboard_lib::web::{api_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Default)]
struct FakeNotifications {
    records: Vec<NotificationRecord>,
    deleted: Mutex<Vec<(NotificationId, UserId)>>,
}

#[async_trait]
impl NotificationService for FakeNotifications {
    async fn fetch_notifications(&self) -> PortResult<NotificationFeed> {
        Ok(NotificationFeed {
            records: self.records.clone(),
            unread_count: self.records.iter().filter(|n| !n.is_read).count(),
        })
    }

    async fn delete_notification(&self, id: NotificationId, user_id: UserId) -> PortResult<()> {
        self.deleted.lock().unwrap().push((id, user_id));
        Ok(())
    }

    async fn mark_notification_read(&self, _id: NotificationId) -> PortResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeSessions {
    sessions: Vec<MilkingSessionRecord>,
    added: Mutex<Vec<MilkingSessionDraft>>,
    reject_with: Option<String>,
    missing: Vec<MilkingSessionId>,
}

#[async_trait]
impl MilkingSessionService for FakeSessions {
    async fn get_milking_sessions(&self) -> PortResult<Vec<MilkingSessionRecord>> {
        Ok(self.sessions.clone())
    }

    async fn add_milking_session(&self, draft: &MilkingSessionDraft) -> PortResult<()> {
        if let Some(message) = &self.reject_with {
            return Err(PortError::Remote(message.clone()));
        }
        self.added.lock().unwrap().push(draft.clone());
        Ok(())
    }

    async fn edit_milking_session(&self, _id: MilkingSessionId, _draft: &MilkingSessionDraft) -> PortResult<()> {
        Ok(())
    }

    async fn delete_milking_session(&self, id: MilkingSessionId) -> PortResult<()> {
        if self.missing.contains(&id) {
            return Err(PortError::NotFound("Milking session not found".into()));
        }
        Ok(())
    }
}

struct FakeHerd {
    managed: Vec<Cow>,
}

#[async_trait]
impl HerdDirectory for FakeHerd {
    async fn list_cows(&self) -> PortResult<Vec<Cow>> {
        Ok(self.managed.clone())
    }

    async fn list_cows_by_user(&self, _user_id: UserId) -> PortResult<Vec<Cow>> {
        Ok(self.managed.clone())
    }

    async fn get_cow_managers(&self, _cow_id: CowId) -> PortResult<Vec<Farmer>> {
        Ok(vec![Farmer { id: 12, name: "Budi".into() }])
    }

    async fn get_all_farmers(&self) -> PortResult<Vec<Farmer>> {
        Ok(vec![Farmer { id: 12, name: "Budi".into() }])
    }
}

struct NoExports;

#[async_trait]
impl ExportService for NoExports {
    async fn export_pdf(&self) -> PortResult<()> {
        Ok(())
    }

    async fn export_excel(&self) -> PortResult<()> {
        Ok(())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

fn config() -> Arc<Config> {
    let config = Config::from_lookup(|key| match key {
        "DAIRYTRACK_API_URL" => Some("http://remote.test".to_string()),
        "DASHBOARD_UTC_OFFSET" => Some("+07:00".to_string()),
        _ => None,
    })
    .unwrap();
    Arc::new(config)
}

fn farmer() -> CurrentUser {
    CurrentUser::from_descriptor(Some(12), None, Some(3), Some("Budi".into()), None).unwrap()
}

fn admin() -> CurrentUser {
    CurrentUser::from_descriptor(None, Some(1), Some(1), Some("Admin".into()), None).unwrap()
}

fn notification(id: i64, is_read: bool, kind: NotificationType) -> NotificationRecord {
    NotificationRecord {
        id,
        message: format!("Notification {}", id),
        kind,
        is_read,
        created_at: None,
        created_at_wib: None,
    }
}

fn at(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

fn session(id: i64, cow_id: CowId, volume: f64, milking_time: &str) -> MilkingSessionRecord {
    MilkingSessionRecord {
        id,
        cow_id,
        cow_name: Some(format!("Cow {}", cow_id)),
        milker_id: 12,
        milker_name: Some("Budi".into()),
        volume,
        milking_time: at(milking_time),
        notes: String::new(),
        created_at: None,
    }
}

struct Harness {
    router: Router,
    notifications: Arc<FakeNotifications>,
    sessions: Arc<FakeSessions>,
}

async fn harness(
    user: Option<CurrentUser>,
    notifications: FakeNotifications,
    sessions: FakeSessions,
    managed: Vec<Cow>,
) -> Harness {
    let notifications = Arc::new(notifications);
    let sessions = Arc::new(sessions);
    let context = Arc::new(SessionContext::new(user));
    let store = NotificationStore::new(notifications.clone());
    let book = Arc::new(MilkingSessionBook::new(
        context.clone(),
        sessions.clone(),
        Arc::new(FakeHerd { managed }),
    ));
    book.load_managed_cows().await.unwrap();
    book.load().await.unwrap();

    let state = Arc::new(AppState::new(config(), context, store, book, Arc::new(NoExports)));
    Harness {
        router: api_router(state),
        notifications,
        sessions,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn cow(id: CowId) -> Cow {
    Cow {
        id,
        name: format!("Cow {}", id),
        gender: Some("Female".into()),
    }
}

//=========================================================================================
// Identity
//=========================================================================================

#[tokio::test]
async fn me_reports_anonymous_and_logged_in_users() {
    let h = harness(None, FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let body = json_body(send(&h.router, "GET", "/me", None).await).await;
    assert_eq!(body["logged_in"], false);

    let h = harness(Some(admin()), FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let body = json_body(send(&h.router, "GET", "/me", None).await).await;
    assert_eq!(body["logged_in"], true);
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["role"], "Admin");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let h = harness(None, FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let response = send(&h.router, "GET", "/me", None).await;
    assert!(response.headers().contains_key("x-request-id"));
}

//=========================================================================================
// Notifications
//=========================================================================================

fn busy_inbox() -> FakeNotifications {
    let mut records: Vec<_> = (1..=10)
        .map(|id| notification(id, false, NotificationType::LowProduction))
        .collect();
    records.push(notification(11, true, NotificationType::HighProduction));
    records.push(notification(12, true, NotificationType::MilkUsed));
    FakeNotifications {
        records,
        ..FakeNotifications::default()
    }
}

#[tokio::test]
async fn dropdown_shows_five_items_and_capped_badge() {
    let h = harness(Some(farmer()), busy_inbox(), FakeSessions::default(), vec![]).await;
    let response = send(&h.router, "GET", "/notifications/dropdown", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["unread_count"], 10);
    assert_eq!(body["badge"], "9+");
    assert_eq!(body["refreshed"], true);
}

#[tokio::test]
async fn panel_filters_and_rejects_unknown_filters() {
    let h = harness(Some(farmer()), busy_inbox(), FakeSessions::default(), vec![]).await;
    send(&h.router, "GET", "/notifications/dropdown", None).await;

    let body = json_body(send(&h.router, "GET", "/notifications?filter=high", None).await).await;
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["items"][0]["id"], 11);

    let body = json_body(send(&h.router, "GET", "/notifications?filter=unread", None).await).await;
    assert_eq!(body["total_items"], 10);
    assert_eq!(body["total_pages"], 2);

    let response = send(&h.router, "GET", "/notifications?filter=bogus", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn marking_read_updates_the_unread_count() {
    let h = harness(Some(farmer()), busy_inbox(), FakeSessions::default(), vec![]).await;
    send(&h.router, "GET", "/notifications/dropdown", None).await;

    let body = json_body(send(&h.router, "POST", "/notifications/1/read", None).await).await;
    assert_eq!(body["changed"], 1);
    assert_eq!(body["unread_count"], 9);

    let body = json_body(send(&h.router, "POST", "/notifications/1/read", None).await).await;
    assert_eq!(body["changed"], 0);

    let body = json_body(send(&h.router, "POST", "/notifications/read-all", None).await).await;
    assert_eq!(body["changed"], 9);
    assert_eq!(body["unread_count"], 0);
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let h = harness(Some(farmer()), busy_inbox(), FakeSessions::default(), vec![]).await;

    let response = send(&h.router, "DELETE", "/notifications/3", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Are you sure you want to delete this notification?");
    assert!(h.notifications.deleted.lock().unwrap().is_empty());

    let response = send(&h.router, "DELETE", "/notifications/3?confirm=true", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], true);
    assert_eq!(*h.notifications.deleted.lock().unwrap(), vec![(3, UserId(12))]);
}

#[tokio::test]
async fn delete_without_a_user_is_unauthorized() {
    let h = harness(None, busy_inbox(), FakeSessions::default(), vec![]).await;
    let response = send(&h.router, "DELETE", "/notifications/3?confirm=true", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"],
        "You must be logged in to perform this action"
    );
}

#[tokio::test]
async fn clear_all_empties_the_local_list() {
    let h = harness(Some(farmer()), busy_inbox(), FakeSessions::default(), vec![]).await;
    send(&h.router, "GET", "/notifications/dropdown", None).await;

    let response = send(&h.router, "DELETE", "/notifications", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = json_body(send(&h.router, "DELETE", "/notifications?confirm=true", None).await).await;
    assert_eq!(body["removed"], 12);

    let body = json_body(send(&h.router, "GET", "/notifications", None).await).await;
    assert_eq!(body["total_items"], 0);
    assert_eq!(body["total_pages"], 1);
}

//=========================================================================================
// Milking sessions
//=========================================================================================

#[tokio::test]
async fn farmer_sees_only_managed_cows() {
    let sessions = FakeSessions {
        sessions: vec![
            session(1, 3, 5.0, "2025-05-10T00:00:00Z"),
            session(2, 4, 7.0, "2025-05-10T00:00:00Z"),
        ],
        ..FakeSessions::default()
    };
    let h = harness(Some(farmer()), FakeNotifications::default(), sessions, vec![cow(3)]).await;

    let body = json_body(send(&h.router, "GET", "/milking-sessions", None).await).await;
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["stats"]["total_volume"], "5.00");
    assert_eq!(body["stats"]["session_count"], 1);
    assert_eq!(body["items"][0]["volume"], "5.00");
    assert_eq!(body["items"][0]["period"], "Morning");
    assert_eq!(body["has_active_filters"], false);
}

#[tokio::test]
async fn session_filters_narrow_the_filtered_stats_only() {
    let sessions = FakeSessions {
        sessions: vec![
            session(1, 3, 5.0, "2025-05-10T00:00:00Z"),
            session(2, 4, 7.0, "2025-05-11T12:00:00Z"),
        ],
        ..FakeSessions::default()
    };
    let h = harness(Some(admin()), FakeNotifications::default(), sessions, vec![]).await;

    let body = json_body(send(&h.router, "GET", "/milking-sessions?cow_id=4", None).await).await;
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["stats"]["total_volume"], "12.00");
    assert_eq!(body["filtered_stats"]["total_volume"], "7.00");
    assert_eq!(body["has_active_filters"], true);

    let body = json_body(send(&h.router, "GET", "/milking-sessions?date=2025-05-10", None).await).await;
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["items"][0]["id"], 1);
}

#[tokio::test]
async fn farmer_add_is_attributed_to_the_farmer() {
    let h = harness(Some(farmer()), FakeNotifications::default(), FakeSessions::default(), vec![cow(3)]).await;
    let draft = serde_json::json!({
        "cow_id": 3,
        "volume": 4.5,
        "milking_time": "2025-05-10T06:00:00Z",
        "notes": "calm"
    });

    let response = send(&h.router, "POST", "/milking-sessions", Some(draft)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let added = h.sessions.added.lock().unwrap().clone();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].milker_id, Some(12));
    assert_eq!(
        added[0].notes.as_deref(),
        Some("calm\n\nCreated by: Budi (Role: Farmer, ID: 12)")
    );
}

#[tokio::test]
async fn admin_add_without_milker_is_rejected() {
    let h = harness(Some(admin()), FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let draft = serde_json::json!({
        "cow_id": 3,
        "volume": 4.5,
        "milking_time": "2025-05-10T06:00:00Z"
    });

    let response = send(&h.router, "POST", "/milking-sessions", Some(draft)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.sessions.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remote_rejection_is_a_bad_gateway_with_its_message() {
    let sessions = FakeSessions {
        reject_with: Some("Cow is not assigned to this farmer".into()),
        ..FakeSessions::default()
    };
    let h = harness(Some(farmer()), FakeNotifications::default(), sessions, vec![cow(3)]).await;
    let draft = serde_json::json!({
        "cow_id": 3,
        "volume": 4.5,
        "milking_time": "2025-05-10T06:00:00Z"
    });

    let response = send(&h.router, "POST", "/milking-sessions", Some(draft)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "Cow is not assigned to this farmer");
}

#[tokio::test]
async fn session_delete_requires_confirmation() {
    let h = harness(Some(farmer()), FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let response = send(&h.router, "DELETE", "/milking-sessions/9", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "You won't be able to revert this!");

    let response = send(&h.router, "DELETE", "/milking-sessions/9?confirm=true", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_session_the_remote_lacks_is_not_found() {
    let sessions = FakeSessions {
        missing: vec![9],
        ..FakeSessions::default()
    };
    let h = harness(Some(admin()), FakeNotifications::default(), sessions, vec![]).await;

    let response = send(&h.router, "DELETE", "/milking-sessions/9?confirm=true", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Milking session not found");
}

#[tokio::test]
async fn milker_lookup_is_admin_only() {
    let h = harness(Some(farmer()), FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let body = json_body(send(&h.router, "GET", "/cows/3/milkers", None).await).await;
    assert!(body.as_array().unwrap().is_empty());

    let h = harness(Some(admin()), FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let body = json_body(send(&h.router, "GET", "/cows/3/milkers", None).await).await;
    assert_eq!(body[0]["name"], "Budi");
}

#[tokio::test]
async fn exports_are_accepted() {
    let h = harness(Some(admin()), FakeNotifications::default(), FakeSessions::default(), vec![]).await;
    let response = send(&h.router, "POST", "/exports/pdf", None).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
