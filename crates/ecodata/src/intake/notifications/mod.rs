//! Per-user notifications and read tracking.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    MarkReadRequest, MarkReadResponse, Notification, NotificationKind, NotificationList,
    NotificationQuery,
};
pub use repository::NotificationRepository;
pub use router::notification_router;
pub use service::NotificationService;
