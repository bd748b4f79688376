//! In-memory adapters for notification ports.

mod directory;
mod notification;
mod push;

pub use directory::InMemoryDirectory;
pub use notification::InMemoryNotificationRepository;
pub use push::{RecordingPushGateway, SentPush};
