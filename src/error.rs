//! Error types for the service container

use crate::ServiceId;
use std::any::TypeId;
use thiserror::Error;

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// A registration already exists for this identity
    #[error("Service already registered: {type_name}")]
    AlreadyRegistered { type_name: &'static str },

    /// The registry has no record for this identity
    #[error("Service is not registered: {type_name}")]
    NotRegistered {
        type_name: &'static str,
        type_id: TypeId,
    },

    /// Neither the registry nor the context store could provide the service
    #[error("Unable to find service {type_name}")]
    ServiceNotFound { type_name: &'static str },

    /// No provider is reachable from the current scope
    #[error("ServiceProvider is not injected under `{key}`, called outside a bootstrapped scope?")]
    NotInjected { key: &'static str },

    /// No context was passed and none is active on this thread
    #[error("No context available: pass one explicitly or call from inside an entered scope")]
    NotInSetup,

    /// A service (transitively) depends on itself
    #[error("Circular dependency detected while resolving {type_name}: {path}")]
    CircularDependency {
        type_name: &'static str,
        path: String,
    },

    /// An annotated field cannot hold the instance its annotation resolves to
    #[error("Field `{field}` of {owner} cannot hold an instance of {dependency}")]
    FieldTypeMismatch {
        owner: &'static str,
        field: &'static str,
        dependency: &'static str,
    },

    /// The registry or context store behind a provider has been dropped
    #[error("The container backing this provider has been dropped")]
    ContainerDropped,

    /// The context store already carries a provider
    #[error("A service provider is already bootstrapped into this context")]
    AlreadyBootstrapped,

    /// Internal error
    #[error("Internal DI error: {0}")]
    Internal(String),
}

impl DiError {
    /// Create an AlreadyRegistered error for an identity
    #[inline]
    pub fn already_registered(id: ServiceId) -> Self {
        Self::AlreadyRegistered {
            type_name: id.name(),
        }
    }

    /// Create a NotRegistered error for an identity
    #[inline]
    pub fn not_registered(id: ServiceId) -> Self {
        Self::NotRegistered {
            type_name: id.name(),
            type_id: id.type_id(),
        }
    }

    /// Create a ServiceNotFound error for a type
    #[inline]
    pub fn service_not_found<T: 'static>() -> Self {
        Self::ServiceNotFound {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a CircularDependency error
    #[inline]
    pub fn circular(id: ServiceId, path: impl Into<String>) -> Self {
        Self::CircularDependency {
            type_name: id.name(),
            path: path.into(),
        }
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;
