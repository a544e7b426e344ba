pub mod export;
pub mod herd;
pub mod milking;
pub mod notifications;
pub mod remote;
pub mod user_store;

pub use export::HttpExportAdapter;
pub use herd::HttpHerdAdapter;
pub use milking::HttpMilkingSessionAdapter;
pub use notifications::HttpNotificationAdapter;
pub use remote::RemoteClient;
pub use user_store::load_current_user;
