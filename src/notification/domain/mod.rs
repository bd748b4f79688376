//! Domain model for lifecycle notifications.

mod event;
mod ids;
mod notification;
mod user;

pub use event::LifecycleEvent;
pub use ids::NotificationId;
pub use notification::{Notification, NotificationKind, NotificationPayload, task_link};
pub use user::UserProfile;
