//! Session tokens, password hashing, and role-based access checks.

mod middleware;
mod password;
mod policy;
mod role;
mod session;

pub use middleware::{resolve_session, session_token};
pub use password::{PasswordError, PasswordHasher};
pub use policy::{authorize, Permission};
pub use role::Role;
pub use session::{CookieSettings, SessionError, SessionService, UserSession};
