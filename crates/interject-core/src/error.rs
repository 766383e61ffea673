//! Error types for Interject operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Interject crates. Uses `thiserror` for derive macros.
//!
//! A failed lookup is never an error here: resolution misses are reported
//! as `Ok(None)` by the registry.

use thiserror::Error;

/// Boxed error produced by user code (constructors, factories).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in Interject operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A registration or proxy request violates a type rule.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A type is not described in the catalog.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An aspect factory could not produce an aspect.
    #[error("Aspect factory error: {0}")]
    AspectFactory(String),

    /// An instance could not be viewed as the requested type.
    #[error("Cannot cast {from} to {to}")]
    Cast {
        /// Type held by the instance.
        from: String,
        /// Requested type.
        to: String,
    },

    /// Recursive resolution went deeper than the configured limit.
    #[error("Resolution depth {depth} exceeded while resolving {service}")]
    DepthExceeded {
        /// Service being resolved when the limit was hit.
        service: String,
        /// Configured limit.
        depth: usize,
    },

    /// I/O error, e.g. while writing a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A constructor or factory failed; the original error is kept as-is.
    #[error(transparent)]
    Construction(BoxError),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an aspect factory error.
    pub fn aspect(msg: impl Into<String>) -> Self {
        Self::AspectFactory(msg.into())
    }

    /// Create a cast error between two type names.
    pub fn cast(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Cast {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Wrap a user error raised by a constructor or factory.
    pub fn construction(err: impl Into<BoxError>) -> Self {
        Self::Construction(err.into())
    }

    /// Recover an `Error` that travelled through a `BoxError`; anything else
    /// becomes a `Construction` failure.
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => *inner,
            Err(user) => Self::Construction(user),
        }
    }

    /// Whether this error was raised at registration/build time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::NotFound(_))
    }

    /// Borrow the user error behind a `Construction` failure.
    pub fn construction_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Construction(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using Interject's Error type.
pub type Result<T> = std::result::Result<T, Error>;
