//! Dependency injection container with compile-time component discovery and startup autowiring.
//!
//! Components describe themselves with explicit [ComponentDefinition](component::ComponentDefinition)s
//! and submit them with [register_component!] under their module path. Startup then proceeds in
//! three strictly sequential phases:
//!
//! 1. [scanning](scanner::ComponentScanner) a configured root namespace for registered
//!    components, without instantiating anything;
//! 2. [instantiating](container::ComponentContainer::from_definitions) each discovered component
//!    exactly once and registering it under its resolved name (and, for services, under every
//!    declared capability contract);
//! 3. [autowiring](autowire::autowire) every declared injectable field against the finished
//!    container.
//!
//! After that the container is read-only for the process lifetime: lookups return the same
//! singleton instance every time, and concurrent unsynchronized reads are safe. The container is
//! a plain owned value - multiple independent containers can coexist, which tests rely on.

pub mod autowire;
pub mod component;
pub mod container;
pub mod error;
pub mod scanner;

// the discovery mechanism behind register_component!
pub use inventory;
