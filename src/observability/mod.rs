//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Workflow steps produce:
//!     → structured log events (start/stop around connection acquisition
//!       and token send, warn events on session/link failures)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing in production
//! - Attempt ID and entity path flow through all workflow events
//! - Observability is consumed for diagnostics only; the workflow has no
//!   behavioral coupling to it

pub mod logging;
