//! Error types for the Bento definition engine.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BentoError (top-level wrapper)
//! ├── Redirection       - resolution failures and explicit control transfers
//! ├── OperatorError     - operand-shape faults raised by the operator engine
//! └── RegistrationError - definition graph construction errors
//! ```
//!
//! Lookups that may legitimately find nothing return `Option` instead of any
//! of these; only active constructions fault.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Redirection
// ============================================================================

/// The single resolution fault.
///
/// A redirection serves both as an intentional control transfer (an explicit
/// redirect written in a definition) and as the failure signal for undefined
/// names, circular definitions and unsupported collection shapes. Guarded
/// blocks intercept it by its `location` tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct Redirection {
    /// Status code.
    pub status: u16,
    /// Target location, or the name that failed to resolve.
    pub location: String,
    /// Optional human-readable detail.
    pub message: Option<String>,
}

impl Redirection {
    pub const STATUS_REDIRECT: u16 = 301;
    pub const STATUS_NOT_FOUND: u16 = 404;
    pub const STATUS_SERVER_ERROR: u16 = 500;

    /// Location tag used for wrapped host faults.
    pub const STANDARD_ERROR: &'static str = "error";
    /// Location tag used for circular definitions.
    pub const CIRCULAR: &'static str = "circular";

    pub fn new(status: u16, location: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status,
            location: location.into(),
            message,
        }
    }

    /// An explicit redirect to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(Self::STATUS_REDIRECT, location, None)
    }

    /// A name that could not be resolved.
    pub fn not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("undefined name '{name}'");
        Self::new(Self::STATUS_NOT_FOUND, name, Some(message))
    }

    /// A name that could not be resolved, with its source position.
    pub fn not_found_at(name: impl Into<String>, span: Span) -> Self {
        let name = name.into();
        let message = format!("undefined name '{name}' at {span}");
        Self::new(Self::STATUS_NOT_FOUND, name, Some(message))
    }

    /// A definition whose delegation or supertype chain does not terminate.
    pub fn circular(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            Self::STATUS_SERVER_ERROR,
            Self::CIRCULAR,
            Some(format!("circular definition '{name}'")),
        )
    }

    /// A collection shape the resolver cannot build.
    pub fn unsupported_collection(name: impl Into<String>, detail: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            Self::STATUS_SERVER_ERROR,
            name.clone(),
            Some(format!("unsupported collection '{name}': {}", detail.into())),
        )
    }

    /// No parameter list of a definition accepts the supplied arguments.
    pub fn no_matching_params(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            Self::STATUS_SERVER_ERROR,
            name.clone(),
            Some(format!("no parameter list of '{name}' matches the arguments")),
        )
    }

    /// A host fault wrapped into a redirection, prefixed by its origin class.
    pub fn standard_error(origin: &str, message: impl std::fmt::Display) -> Self {
        Self::new(
            Self::STATUS_SERVER_ERROR,
            Self::STANDARD_ERROR,
            Some(format!("{origin}: {message}")),
        )
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

impl std::fmt::Display for Redirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.location)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Operator Errors
// ============================================================================

/// Host-level faults raised by the operator engine.
///
/// These represent definition-authoring errors (mismatched operand shapes)
/// rather than legitimate redirect targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    /// The operator is not defined for these operand classes.
    #[error("unsupported operation: {op} on {left} and {right}")]
    UnsupportedOperation {
        op: String,
        left: String,
        right: String,
    },

    /// Element-wise operation over collections of different lengths.
    #[error("collection length mismatch for {op}: {left} vs {right}")]
    LengthMismatch { op: String, left: usize, right: usize },

    /// Element-wise operation over a sequence and a mapping.
    #[error("collection kind mismatch for {op}: {left} vs {right}")]
    KindMismatch {
        op: String,
        left: String,
        right: String,
    },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A deferred operand was forced after its scope moved on.
    #[error("deferred operand forced outside of its scope")]
    StaleOperand,
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while building the definition graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A definition with this name already exists under the same owner.
    #[error("duplicate definition: '{name}' already defined in '{owner}'")]
    DuplicateDefinition { name: String, owner: String },

    /// The owner handle does not refer to a definition.
    #[error("unknown owner: {0}")]
    UnknownOwner(String),

    /// The definition is malformed.
    #[error("invalid definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}

// ============================================================================
// Top-level error
// ============================================================================

/// Unified error type for every fault that can abort an instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BentoError {
    #[error(transparent)]
    Redirect(#[from] Redirection),

    #[error(transparent)]
    Operator(#[from] OperatorError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl BentoError {
    /// Name of the class that raised this fault, used as the prefix when a
    /// host fault is wrapped into a standard-error redirection.
    pub fn origin(&self) -> &'static str {
        match self {
            BentoError::Redirect(_) => "Redirection",
            BentoError::Operator(_) => "OperatorError",
            BentoError::Registration(_) => "RegistrationError",
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, BentoError::Redirect(_))
    }

    pub fn as_redirection(&self) -> Option<&Redirection> {
        match self {
            BentoError::Redirect(r) => Some(r),
            _ => None,
        }
    }

    /// Convert into a redirection, wrapping host faults as standard errors.
    pub fn into_redirection(self) -> Redirection {
        match self {
            BentoError::Redirect(r) => r,
            other => Redirection::standard_error(other.origin(), &other),
        }
    }
}

/// Result alias for resolution functions.
pub type ResolveResult<T> = Result<T, BentoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirection_display() {
        let r = Redirection::redirect("/home");
        assert_eq!(r.to_string(), "301 /home");
        assert!(r.is_redirect());

        let nf = Redirection::not_found("widget");
        assert_eq!(nf.to_string(), "404 widget: undefined name 'widget'");
        assert!(!nf.is_redirect());
    }

    #[test]
    fn host_faults_wrap_with_origin_prefix() {
        let err = BentoError::from(OperatorError::DivisionByZero);
        let r = err.into_redirection();
        assert_eq!(r.location, Redirection::STANDARD_ERROR);
        assert_eq!(r.message.as_deref(), Some("OperatorError: division by zero"));
    }

    #[test]
    fn redirections_pass_through_unwrapped() {
        let err = BentoError::from(Redirection::redirect("x"));
        assert_eq!(err.origin(), "Redirection");
        assert_eq!(err.into_redirection().location, "x");
    }

    #[test]
    fn operator_error_messages() {
        let err = OperatorError::LengthMismatch {
            op: "&".into(),
            left: 3,
            right: 2,
        };
        assert_eq!(err.to_string(), "collection length mismatch for &: 3 vs 2");
    }
}
