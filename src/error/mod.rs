//! Client-facing error taxonomy and failure translation.
//!
//! # Data Flow
//! ```text
//! TransportError (raw, protocol-level)
//!     → categorize() (stable failure category)
//!     → session_failure() / link_failure() (taxonomy member with
//!       entity path, diagnostic context, cleanup outcome)
//!     → caller decides whether to retry the whole invocation
//! ```
//!
//! # Design Decisions
//! - Callers never see a raw transport error as the top-level failure
//! - Connection and authentication failures propagate untranslated inside
//!   their taxonomy variant: no resources existed yet
//! - Session and link failures carry the diagnostic inner error recorded by
//!   the transport, when one exists

use thiserror::Error;

use crate::transport::TransportError;

/// Stable classification of a low-level failure, shared with the rest of the
/// client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// The operation ran out of time.
    Timeout,
    /// The remote rejected the caller's claims.
    Unauthorized,
    /// A broker-side quota was exceeded.
    QuotaExceeded,
    /// The addressed entity does not exist.
    EntityNotFound,
    /// The remote service is unreachable or shedding load.
    ServiceUnavailable,
    /// Anything without a more specific classification.
    General,
}

impl FailureCategory {
    /// Whether a caller retrying the whole invocation could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::ServiceUnavailable)
    }
}

/// Map a raw transport error onto the stable category taxonomy.
pub fn categorize(error: &TransportError) -> FailureCategory {
    match error {
        TransportError::Timeout(_) => FailureCategory::Timeout,
        TransportError::Unauthorized(_) => FailureCategory::Unauthorized,
        TransportError::QuotaExceeded(_) => FailureCategory::QuotaExceeded,
        TransportError::NotFound(_) => FailureCategory::EntityNotFound,
        TransportError::Unavailable(_) => FailureCategory::ServiceUnavailable,
        TransportError::Protocol(_) => FailureCategory::General,
    }
}

/// The failure outcomes of one link-establishment invocation.
///
/// Exactly one of these four kinds is returned on failure; partial state is
/// never returned and every resource created during the attempt has been
/// released before the error propagates.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No connection could be obtained within the budget. Propagated from
    /// the provisioner as-is; the connection layer owns its own retries.
    #[error("connection unavailable for '{entity_path}': {source}")]
    ConnectionUnavailable {
        entity_path: String,
        #[source]
        source: TransportError,
    },

    /// CBS token exchange was rejected or timed out. No session or link
    /// existed yet, so nothing was cleaned up.
    #[error("authentication failed for '{entity_path}': {source}")]
    AuthenticationFailed {
        entity_path: String,
        #[source]
        source: TransportError,
    },

    /// Session construction or open failed; the session (if instantiated)
    /// was aborted.
    #[error("{message}")]
    SessionCreationFailed {
        entity_path: String,
        category: FailureCategory,
        /// The session's own diagnostic error, when the transport recorded one.
        diagnostic: Option<TransportError>,
        message: String,
        #[source]
        source: TransportError,
    },

    /// Link construction or open failed; the owning session was closed with
    /// the triggering cause attached.
    #[error("{message}")]
    LinkCreationFailed {
        entity_path: String,
        category: FailureCategory,
        /// The link's own diagnostic error, when a link object existed.
        diagnostic: Option<TransportError>,
        /// True when the session was still mid-close when the error was
        /// raised: the remote may briefly still regard the session as live.
        session_closing: bool,
        message: String,
        #[source]
        source: TransportError,
    },
}

impl LinkError {
    /// The entity path the failed attempt was addressing.
    pub fn entity_path(&self) -> &str {
        match self {
            Self::ConnectionUnavailable { entity_path, .. }
            | Self::AuthenticationFailed { entity_path, .. }
            | Self::SessionCreationFailed { entity_path, .. }
            | Self::LinkCreationFailed { entity_path, .. } => entity_path,
        }
    }

    /// Stable category of the underlying failure.
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::ConnectionUnavailable { source, .. }
            | Self::AuthenticationFailed { source, .. } => categorize(source),
            Self::SessionCreationFailed { category, .. }
            | Self::LinkCreationFailed { category, .. } => *category,
        }
    }

    /// Whether a caller retrying the whole invocation could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        self.category().is_transient()
    }
}

/// Diagnostic identity of the attempt being translated.
pub(crate) struct ErrorContext<'a> {
    pub entity_path: &'a str,
    pub client_id: &'a str,
}

/// Translate a session construction/open failure into its taxonomy member.
pub(crate) fn session_failure(
    ctx: &ErrorContext<'_>,
    diagnostic: Option<TransportError>,
    source: TransportError,
) -> LinkError {
    let category = categorize(&source);
    let message = match &diagnostic {
        Some(inner) => format!(
            "session creation failed for '{}' (client {}): {source} [session: {inner}]",
            ctx.entity_path, ctx.client_id
        ),
        None => format!(
            "session creation failed for '{}' (client {}): {source}",
            ctx.entity_path, ctx.client_id
        ),
    };
    LinkError::SessionCreationFailed {
        entity_path: ctx.entity_path.to_string(),
        category,
        diagnostic,
        message,
        source,
    }
}

/// Translate a link construction/open failure into its taxonomy member.
pub(crate) fn link_failure(
    ctx: &ErrorContext<'_>,
    diagnostic: Option<TransportError>,
    session_closing: bool,
    source: TransportError,
) -> LinkError {
    let category = categorize(&source);
    let mut message = format!(
        "link creation failed for '{}' (client {}): {source}",
        ctx.entity_path, ctx.client_id
    );
    if let Some(inner) = &diagnostic {
        message.push_str(&format!(" [link: {inner}]"));
    }
    if session_closing {
        message.push_str(" (session still closing)");
    }
    LinkError::LinkCreationFailed {
        entity_path: ctx.entity_path.to_string(),
        category,
        diagnostic,
        session_closing,
        message,
        source,
    }
}
