//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (timeouts > 0, credit > 0)
//! - Check role/address consistency on link settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the config types
//! - Runs before a config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{ClientConfig, LinkRole, LinkSettings};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    #[error("endpoint '{0}' is not a valid URL")]
    InvalidEndpoint(String),

    #[error("entity_path must not be empty")]
    EmptyEntityPath,

    #[error("operation_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("link credit must be greater than zero")]
    ZeroCredit,

    #[error("sender links require a target address")]
    SenderWithoutTarget,

    #[error("receiver links require a source address")]
    ReceiverWithoutSource,
}

/// Validate a client configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoint.is_empty() {
        errors.push(ValidationError::EmptyEndpoint);
    } else if Url::parse(&config.endpoint).is_err() {
        errors.push(ValidationError::InvalidEndpoint(config.endpoint.clone()));
    }

    if config.entity_path.is_empty() {
        errors.push(ValidationError::EmptyEntityPath);
    }

    if config.operation_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate link settings, collecting every problem found.
pub fn validate_link_settings(settings: &LinkSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.credit == 0 {
        errors.push(ValidationError::ZeroCredit);
    }

    match settings.role {
        LinkRole::Sender if settings.target.is_none() => {
            errors.push(ValidationError::SenderWithoutTarget);
        }
        LinkRole::Receiver if settings.source.is_none() => {
            errors.push(ValidationError::ReceiverWithoutSource);
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
