//! Claims-based-security (CBS) token negotiation.
//!
//! # Data Flow
//! ```text
//! EndpointDescriptor (resource URI + required claims)
//!     → CbsTokenProvider (issues a token, owned externally)
//!     → CbsChannel (transmits it over the connection)
//!     → token expiry returned to the workflow
//! ```
//!
//! # Design Decisions
//! - Negotiation completes before any session is created, so claims are
//!   valid for the whole lifetime of resources created afterwards
//! - Failures propagate untranslated: no session or link exists yet,
//!   there is nothing to clean up
//! - Expiry is returned, not stored; renewal scheduling is the caller's job

use async_trait::async_trait;
use std::time::{Duration, SystemTime};
use url::Url;

use crate::transport::{Connection, TransportError, TransportResult};

/// A security token covering a set of claims on a resource.
#[derive(Debug, Clone)]
pub struct CbsToken {
    /// The opaque token value transmitted to the broker.
    pub value: String,
    /// Token type discriminator (e.g. a SAS or JWT marker).
    pub token_type: String,
    /// Instant after which the token is no longer valid.
    pub expires_at_utc: SystemTime,
}

/// Issues tokens for a resource. Credential and signing logic live behind
/// this trait, outside this crate.
#[async_trait]
pub trait CbsTokenProvider: Send + Sync {
    /// Issue a token for `applies_to` on the namespace at `endpoint`,
    /// covering `required_claims`.
    async fn token(
        &self,
        endpoint: &Url,
        applies_to: &str,
        required_claims: &[String],
    ) -> TransportResult<CbsToken>;
}

/// The connection's claims-based-security capability: transmits tokens from
/// a provider to the broker over the shared connection.
#[async_trait]
pub trait CbsChannel: Send + Sync {
    /// Send a token for `audience`/`resource` with `required_claims`,
    /// completing within `timeout`. Returns the accepted token's expiry.
    #[allow(clippy::too_many_arguments)]
    async fn send_token(
        &self,
        provider: &dyn CbsTokenProvider,
        endpoint: &Url,
        audience: &str,
        resource: &str,
        required_claims: &[String],
        timeout: Duration,
    ) -> TransportResult<SystemTime>;
}

/// Immutable identity of the remote entity being linked to.
///
/// Built once at link-creator construction and never mutated.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    entity_path: String,
    endpoint: Url,
    required_claims: Vec<String>,
}

impl EndpointDescriptor {
    pub fn new(entity_path: impl Into<String>, endpoint: Url, required_claims: Vec<String>) -> Self {
        Self {
            entity_path: entity_path.into(),
            endpoint,
            required_claims,
        }
    }

    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn required_claims(&self) -> &[String] {
        &self.required_claims
    }
}

/// Negotiate authentication for `descriptor` over `connection`.
///
/// Locates the connection's CBS capability and sends a token covering the
/// endpoint's absolute URI (used as both audience and resource) and the
/// descriptor's required claims. Returns the token's expiry so the caller
/// can schedule proactive renewal.
pub async fn negotiate(
    connection: &dyn Connection,
    descriptor: &EndpointDescriptor,
    provider: &dyn CbsTokenProvider,
    remaining: Duration,
) -> TransportResult<SystemTime> {
    let channel = connection.cbs_channel().ok_or_else(|| {
        TransportError::Protocol("connection does not expose a CBS channel".to_string())
    })?;

    let resource = descriptor.endpoint.as_str();
    tracing::debug!(
        endpoint = %descriptor.endpoint,
        resource,
        claims = ?descriptor.required_claims,
        "sending authentication token"
    );
    let expires_at = channel
        .send_token(
            provider,
            &descriptor.endpoint,
            resource,
            resource,
            &descriptor.required_claims,
            remaining,
        )
        .await?;
    tracing::debug!(entity_path = %descriptor.entity_path, "authentication token accepted");

    Ok(expires_at)
}
