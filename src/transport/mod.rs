//! Opaque transport resource contracts.
//!
//! # Data Flow
//! ```text
//! ConnectionProvisioner (pool, owned externally)
//!     → Connection (shared handle, capability lookup only)
//!         → Session (created per attempt, exclusively owned)
//!             → Link (created per attempt, exclusively owned)
//! ```
//!
//! # Design Decisions
//! - The wire codec and session/link primitives live behind these traits;
//!   this crate only drives their open/close/abort lifecycle
//! - Connection thread-safety is the provisioner's responsibility
//! - Sessions and links are single-owner: no locking is needed because no
//!   two steps of one invocation run concurrently

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::auth::CbsChannel;

/// Errors produced by the transport collaborators (connection pool, session
/// and link primitives, CBS channel).
///
/// These are the raw, protocol-level failures. They are never surfaced to
/// callers of the workflow directly; see [`crate::error`] for translation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The operation did not complete within its allotted time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The remote rejected the operation as unauthorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A broker-side quota (entity size, link count, ...) was exceeded.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The addressed entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// The remote service is unreachable or refusing work.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A protocol-level fault with no more specific classification.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Settings for a session to be created on a connection.
///
/// The property set is extensible and starts empty; the broker may attach
/// meaning to individual keys.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub properties: HashMap<String, serde_json::Value>,
}

/// A shared, open transport connection.
///
/// Handles are borrowed from the [`ConnectionProvisioner`]; multiple
/// concurrent establishment attempts may hold the same handle. This crate
/// performs capability lookups and session creation only; it never manages
/// the connection's lifetime.
pub trait Connection: Send + Sync {
    /// Locate the connection's claims-based-security capability, if the
    /// transport negotiated one.
    fn cbs_channel(&self) -> Option<Arc<dyn CbsChannel>>;

    /// Create an unopened session scoped to this connection.
    fn create_session(&self, settings: SessionSettings) -> TransportResult<Box<dyn Session>>;
}

/// A protocol session scoped to a connection.
///
/// Exclusively owned by one establishment attempt from creation until it is
/// either handed to the caller (opened) or torn down on a failure path.
#[async_trait]
pub trait Session: Send + Sync {
    /// Open the session, completing within `timeout`.
    async fn open(&mut self, timeout: Duration) -> TransportResult<()>;

    /// Hard, non-negotiated teardown. Used when the session may be in an
    /// indeterminate state (open never completed).
    fn abort(&mut self);

    /// Graceful, reason-carrying teardown. Used when the session is known to
    /// be open; `reason` is conveyed to the remote where the protocol allows.
    async fn close(&mut self, reason: &TransportError) -> TransportResult<()>;

    /// Whether the session is in (or has entered) its closing handshake.
    fn is_closing(&self) -> bool;

    /// The session's own diagnostic error, if the transport recorded one.
    fn inner_error(&self) -> Option<TransportError>;
}

/// An unopened or opened link bound to a session.
///
/// An unopened link has no independent teardown; failed links are discarded
/// by closing their owning session.
#[async_trait]
pub trait Link: Send + Sync {
    /// Open the link, completing within `timeout`.
    async fn open(&mut self, timeout: Duration) -> TransportResult<()>;

    /// The link's own diagnostic error, if the transport recorded one.
    fn inner_error(&self) -> Option<TransportError>;
}

/// Supplies a shared, already-open (or newly opened) connection for a logical
/// endpoint. Connection lifetime and reuse policy are owned by the
/// implementation, not by this crate.
#[async_trait]
pub trait ConnectionProvisioner: Send + Sync {
    /// Return a usable connection within `remaining`, or fail.
    async fn acquire(&self, remaining: Duration) -> TransportResult<Arc<dyn Connection>>;
}
