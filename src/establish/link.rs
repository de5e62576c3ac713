//! Link establishment.
//!
//! # Responsibilities
//! - Delegate link construction to the role-specific factory hook
//! - Open the link within the remaining budget
//! - Tear the session down on any failure
//!
//! # Failure Policy
//! Unlike the session path, the session here is known to be open, so it is
//! closed gracefully with the triggering cause attached rather than aborted.
//! The translated error carries the link's diagnostic inner error (if a link
//! object exists) and whether the session was still mid-close, since the
//! remote may briefly still regard the session as live. If the close itself
//! fails, that secondary error is logged and suppressed; the original link
//! failure is the one surfaced.

use crate::config::schema::LinkSettings;
use crate::error::{self, ErrorContext, LinkError};
use crate::establish::AttemptId;
use crate::timeout::TimeoutBudget;
use crate::transport::{Connection, Link, Session, TransportError, TransportResult};

/// Constructs an unopened link bound to a session.
///
/// Implemented once per link role (sender, receiver, management) by the
/// embedding transport; the workflow only drives the returned link's open.
pub trait LinkFactory: Send + Sync {
    /// Build an unopened link on `session` with the given settings.
    fn build_link(
        &self,
        connection: &dyn Connection,
        settings: &LinkSettings,
        session: &mut dyn Session,
    ) -> TransportResult<Box<dyn Link>>;
}

/// Build the link via `factory` and open it within the remaining budget.
///
/// On success returns the opened link together with its owning session. On
/// any failure the session receives exactly one reason-carrying close before
/// the translated error is returned.
pub(crate) async fn open_link(
    connection: &dyn Connection,
    settings: &LinkSettings,
    mut session: Box<dyn Session>,
    factory: &dyn LinkFactory,
    budget: &TimeoutBudget,
    ctx: &ErrorContext<'_>,
    attempt: AttemptId,
) -> Result<(Box<dyn Link>, Box<dyn Session>), LinkError> {
    let mut link = match factory.build_link(connection, settings, session.as_mut()) {
        Ok(link) => link,
        Err(source) => return Err(fail(session, None, source, ctx, attempt).await),
    };

    let remaining = budget.remaining();
    match link.open(remaining).await {
        Ok(()) => Ok((link, session)),
        Err(source) => {
            let diagnostic = link.inner_error();
            Err(fail(session, diagnostic, source, ctx, attempt).await)
        }
    }
}

/// Close the session with the triggering cause and translate the failure.
async fn fail(
    mut session: Box<dyn Session>,
    diagnostic: Option<TransportError>,
    cause: TransportError,
    ctx: &ErrorContext<'_>,
    attempt: AttemptId,
) -> LinkError {
    tracing::warn!(
        %attempt,
        entity_path = ctx.entity_path,
        client_id = ctx.client_id,
        error = %cause,
        "link creation failed, closing session"
    );
    if let Err(close_error) = session.close(&cause).await {
        tracing::warn!(
            %attempt,
            entity_path = ctx.entity_path,
            client_id = ctx.client_id,
            error = %close_error,
            "session close failed after link failure"
        );
    }
    error::link_failure(ctx, diagnostic, session.is_closing(), cause)
}
