//! Link establishment workflow.
//!
//! # States
//! ```text
//! Idle → ConnectionAcquired → Authenticated → SessionOpen → LinkOpen (success)
//!
//! Failure transitions:
//!     ConnectionAcquired pending → ConnectionUnavailable (fatal)
//!     Authenticated pending      → AuthenticationFailed (fatal)
//!     SessionOpen pending        → session aborted → SessionCreationFailed
//!     LinkOpen pending           → session closed  → LinkCreationFailed
//! ```
//!
//! # Design Decisions
//! - Steps execute strictly sequentially; no state is re-entered
//! - One timeout budget spans the whole sequence; each step reads the
//!   remaining time once, immediately before its I/O
//! - Cleanup is layer-appropriate: abort for a session that never finished
//!   opening, graceful reason-carrying close for a session that did
//! - Authentication completes before any session exists, so claims cover
//!   the full lifetime of everything created afterwards

pub mod link;
pub mod session;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use url::Url;
use uuid::Uuid;

use crate::auth::{self, CbsTokenProvider, EndpointDescriptor};
use crate::config::schema::{ClientConfig, LinkSettings};
use crate::config::validation::{validate_config, validate_link_settings, ValidationError};
use crate::error::{ErrorContext, LinkError};
use crate::timeout::TimeoutBudget;
use crate::transport::{ConnectionProvisioner, Link, Session, TransportError};

pub use link::LinkFactory;

/// Global atomic counter for attempt IDs.
/// Relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static ATTEMPT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one establishment attempt, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Generate a new unique attempt ID.
    pub fn new() -> Self {
        Self(ATTEMPT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// Generate a client identifier with a uuid suffix (diagnostics only).
pub fn generate_client_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// The successful outcome of one establishment attempt: an opened link, its
/// opened owning session, and the authentication token's expiry for
/// caller-side renewal scheduling.
pub struct EstablishedLink {
    pub link: Box<dyn Link>,
    pub session: Box<dyn Session>,
    pub token_expires_at: SystemTime,
}

impl std::fmt::Debug for EstablishedLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstablishedLink")
            .field("token_expires_at", &self.token_expires_at)
            .finish_non_exhaustive()
    }
}

/// Establishes an authenticated link to one remote entity.
///
/// Holds only immutable inputs; [`LinkCreator::establish`] executes exactly
/// once per call and concurrent calls (for the same or different creators)
/// share nothing but the connection handle.
pub struct LinkCreator {
    entity_path: String,
    provisioner: Arc<dyn ConnectionProvisioner>,
    descriptor: EndpointDescriptor,
    token_provider: Arc<dyn CbsTokenProvider>,
    settings: LinkSettings,
    factory: Box<dyn LinkFactory>,
    client_id: String,
    operation_timeout: Duration,
}

impl std::fmt::Debug for LinkCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkCreator")
            .field("entity_path", &self.entity_path)
            .field("client_id", &self.client_id)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl LinkCreator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity_path: impl Into<String>,
        provisioner: Arc<dyn ConnectionProvisioner>,
        endpoint: Url,
        required_claims: Vec<String>,
        token_provider: Arc<dyn CbsTokenProvider>,
        settings: LinkSettings,
        factory: Box<dyn LinkFactory>,
        client_id: impl Into<String>,
        operation_timeout: Duration,
    ) -> Self {
        let entity_path = entity_path.into();
        let descriptor = EndpointDescriptor::new(entity_path.clone(), endpoint, required_claims);
        Self {
            entity_path,
            provisioner,
            descriptor,
            token_provider,
            settings,
            factory,
            client_id: client_id.into(),
            operation_timeout,
        }
    }

    /// Build a creator from a validated [`ClientConfig`].
    ///
    /// Collects every semantic problem in the config and link settings
    /// rather than stopping at the first. The endpoint URI for
    /// authentication is the namespace endpoint joined with the entity path,
    /// and the client identifier is generated from the configured prefix.
    pub fn from_config(
        config: &ClientConfig,
        provisioner: Arc<dyn ConnectionProvisioner>,
        required_claims: Vec<String>,
        token_provider: Arc<dyn CbsTokenProvider>,
        settings: LinkSettings,
        factory: Box<dyn LinkFactory>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Err(found) = validate_config(config) {
            errors.extend(found);
        }
        if let Err(found) = validate_link_settings(&settings) {
            errors.extend(found);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let endpoint = Url::parse(&config.endpoint)
            .and_then(|base| base.join(&config.entity_path))
            .map_err(|_| vec![ValidationError::InvalidEndpoint(config.endpoint.clone())])?;
        let client_id = generate_client_id(&config.client_id_prefix);
        Ok(Self::new(
            config.entity_path.clone(),
            provisioner,
            endpoint,
            required_claims,
            token_provider,
            settings,
            factory,
            client_id,
            config.operation_timeout(),
        ))
    }

    /// The client identifier used in diagnostics.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The entity path this creator addresses.
    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    /// Run one establishment attempt: acquire connection, negotiate
    /// authentication, open a session, open the link, all within a single
    /// timeout budget.
    ///
    /// On failure every resource created during the attempt has been
    /// released before the error is returned; callers may retry the whole
    /// invocation with no cleanup of their own.
    pub async fn establish(&self) -> Result<EstablishedLink, LinkError> {
        let budget = TimeoutBudget::new(self.operation_timeout);
        let attempt = AttemptId::new();
        let ctx = ErrorContext {
            entity_path: &self.entity_path,
            client_id: &self.client_id,
        };

        // Acquire connection
        let remaining = budget.remaining();
        if remaining.is_zero() {
            return Err(LinkError::ConnectionUnavailable {
                entity_path: self.entity_path.clone(),
                source: TransportError::Timeout(Duration::ZERO),
            });
        }
        tracing::debug!(
            %attempt,
            entity_path = %self.entity_path,
            client_id = %self.client_id,
            "acquiring connection"
        );
        let connection = self
            .provisioner
            .acquire(remaining)
            .await
            .map_err(|source| LinkError::ConnectionUnavailable {
                entity_path: self.entity_path.clone(),
                source,
            })?;
        tracing::debug!(%attempt, entity_path = %self.entity_path, "connection acquired");

        // Authenticate over CBS
        let remaining = budget.remaining();
        if remaining.is_zero() {
            return Err(LinkError::AuthenticationFailed {
                entity_path: self.entity_path.clone(),
                source: TransportError::Timeout(Duration::ZERO),
            });
        }
        let token_expires_at = auth::negotiate(
            connection.as_ref(),
            &self.descriptor,
            self.token_provider.as_ref(),
            remaining,
        )
        .await
        .map_err(|source| LinkError::AuthenticationFailed {
            entity_path: self.entity_path.clone(),
            source,
        })?;

        // Create and open session
        let session =
            session::open_session(connection.as_ref(), &budget, &ctx, attempt).await?;

        // Create and open link
        let (link, session) = link::open_link(
            connection.as_ref(),
            &self.settings,
            session,
            self.factory.as_ref(),
            &budget,
            &ctx,
            attempt,
        )
        .await?;

        tracing::debug!(
            %attempt,
            entity_path = %self.entity_path,
            elapsed = ?budget.elapsed(),
            "link established"
        );
        Ok(EstablishedLink {
            link,
            session,
            token_expires_at,
        })
    }
}
