//! Errors surfaced by the site facade.

use std::sync::PoisonError;

use bento_core::{BentoError, RegistrationError};
use thiserror::Error;

/// Faults of site operations: resolution faults, registration errors and
/// poisoned locks.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Resolve(#[from] BentoError),

    /// A thread panicked while holding one of the site's locks.
    #[error("site lock poisoned")]
    Poisoned,

    #[error("unknown owner '{0}'")]
    UnknownOwner(String),
}

impl From<RegistrationError> for SiteError {
    fn from(err: RegistrationError) -> Self {
        SiteError::Resolve(err.into())
    }
}

impl<T> From<PoisonError<T>> for SiteError {
    fn from(_: PoisonError<T>) -> Self {
        SiteError::Poisoned
    }
}

impl SiteError {
    /// The resolution fault, if this is one.
    pub fn as_bento(&self) -> Option<&BentoError> {
        match self {
            SiteError::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

pub type SiteResult<T> = Result<T, SiteError>;
