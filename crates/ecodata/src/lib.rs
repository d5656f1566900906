//! Document intake core for the EcoData platform.
//!
//! Uploaded documents flow through the [`extraction`] dispatcher, resource services under
//! [`intake`] apply role checks from [`auth`] and append to the [`audit`] trail, and
//! [`app`] assembles everything into a single axum router.

pub mod app;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod extraction;
pub mod health;
pub mod intake;
pub mod knowledge;
pub mod pagination;
pub mod persistence;
pub mod telemetry;

pub use app::{intake_router, IntakeServices};
pub use error::{AppError, ServiceError};
