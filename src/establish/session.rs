//! Session establishment.
//!
//! # Responsibilities
//! - Build session settings (empty extensible property set)
//! - Create the session object scoped to the connection
//! - Open it within the remaining budget
//!
//! # Failure Policy
//! A session that failed to open may be in an indeterminate state, so it is
//! aborted: hard teardown, no close handshake. The translated error carries
//! the session's diagnostic inner error when the transport recorded one.
//! A session that could not be instantiated at all leaves nothing to clean up.

use std::time::Duration;

use crate::error::{self, ErrorContext, LinkError};
use crate::establish::AttemptId;
use crate::timeout::TimeoutBudget;
use crate::transport::{Connection, Session, SessionSettings, TransportError};

/// Create a session on `connection` and open it within the remaining budget.
///
/// Returns the opened session, exclusively owned by this attempt. On any
/// failure the session (if one was instantiated) receives exactly one abort
/// before the translated error is returned. An already-exhausted budget
/// fails with a timeout before the session is even created.
pub(crate) async fn open_session(
    connection: &dyn Connection,
    budget: &TimeoutBudget,
    ctx: &ErrorContext<'_>,
    attempt: AttemptId,
) -> Result<Box<dyn Session>, LinkError> {
    let remaining = budget.remaining();
    if remaining.is_zero() {
        return Err(error::session_failure(
            ctx,
            None,
            TransportError::Timeout(Duration::ZERO),
        ));
    }

    let settings = SessionSettings::default();
    let mut session = match connection.create_session(settings) {
        Ok(session) => session,
        Err(source) => {
            tracing::warn!(
                %attempt,
                entity_path = ctx.entity_path,
                client_id = ctx.client_id,
                error = %source,
                "session creation failed"
            );
            return Err(error::session_failure(ctx, None, source));
        }
    };

    match session.open(remaining).await {
        Ok(()) => Ok(session),
        Err(source) => {
            tracing::warn!(
                %attempt,
                entity_path = ctx.entity_path,
                client_id = ctx.client_id,
                error = %source,
                "session open failed, aborting session"
            );
            session.abort();
            let diagnostic = session.inner_error();
            Err(error::session_failure(ctx, diagnostic, source))
        }
    }
}
