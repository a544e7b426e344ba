pub mod context;
pub mod domain;
pub mod milking_book;
pub mod notification_store;
pub mod notification_view;
pub mod ports;
pub mod session_view;
pub mod single_flight;
pub mod throttle;

pub use context::{SessionContext, SessionScope};
pub use domain::{
    Cow, CowId, CurrentUser, Farmer, MilkingSessionDraft, MilkingSessionId, MilkingSessionRecord,
    NotificationFeed, NotificationId, NotificationRecord, NotificationType, Role, UserId,
};
pub use milking_book::{MilkingSessionBook, SessionDeleteOutcome};
pub use notification_store::{ClearOutcome, DeleteOutcome, DropdownView, NotificationStore, RefreshOutcome};
pub use notification_view::{NotificationBrowser, NotificationFilter, NotificationPage, NotificationQuery};
pub use ports::{
    ConfirmPrompt, Confirmer, ExportService, HerdDirectory, MilkingSessionService,
    NotificationService, PortError, PortResult,
};
pub use session_view::{LocalCalendar, SessionFilters, SessionProjection, SessionQuery, VolumeStats};
pub use throttle::{FetchThrottle, FetchTrigger};
