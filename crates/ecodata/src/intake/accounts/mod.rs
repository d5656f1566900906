//! User registration and session login/logout.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    normalize_email, LoginRequest, RegisterRequest, RegisteredResponse, SessionResponse, User,
    UserView,
};
pub use repository::UserRepository;
pub use router::account_router;
pub use service::{AccountService, LoginOutcome};
