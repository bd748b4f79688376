//! Port contracts for notification delivery.

pub mod directory;
pub mod push;
pub mod repository;

pub use directory::{DirectoryError, DirectoryResult, DirectoryService};
pub use push::{MulticastReport, PushError, PushGateway, PushMessage, TokenFailure};
pub use repository::{
    NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult,
};
