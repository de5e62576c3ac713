//! Link establishment for messaging clients.
//!
//! Coordinates connection acquisition, claims-based-security authentication,
//! and the nested session/link handshake under a single caller-supplied
//! timeout budget, with layer-appropriate cleanup on every failure path.

pub mod auth;
pub mod config;
pub mod error;
pub mod establish;
pub mod observability;
pub mod timeout;
pub mod transport;

pub use config::ClientConfig;
pub use error::{FailureCategory, LinkError};
pub use establish::{generate_client_id, EstablishedLink, LinkCreator, LinkFactory};
pub use timeout::TimeoutBudget;
