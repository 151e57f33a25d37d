use thiserror::Error;

/// Errors related to discovering components in a scan namespace.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiscoveryError {
    #[error("Cannot resolve scan namespace to any registered components: {0}")]
    UnknownNamespace(String),
}

/// Errors related to registering components in a container. Registration either runs to
/// completion, or the whole startup aborts - there is no partial rollback.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ConflictError {
    #[error("Attempted to register a duplicated component with name: {0}")]
    DuplicateComponentName(String),
    #[error("Capability '{capability}' is already bound to component '{existing}' - use an explicit unique name")]
    CapabilityAlreadyBound {
        capability: String,
        existing: String,
    },
}

/// Errors related to binding dependencies onto already-constructed components.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WiringError {
    #[error("Cannot resolve dependency '{dependency}' for field '{field}' of component '{component}'")]
    UnresolvedDependency {
        component: String,
        field: &'static str,
        dependency: String,
    },
    #[error("Dependency '{dependency}' cannot be bound to field '{field}' of component '{component}': incompatible type")]
    IncompatibleDependency {
        component: String,
        field: &'static str,
        dependency: String,
    },
    #[error("Component '{component}' does not match its declared type while binding field '{field}'")]
    InvalidInjectionTarget {
        component: String,
        field: &'static str,
    },
}
