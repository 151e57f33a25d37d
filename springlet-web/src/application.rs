//! Application bootstrap tying the startup phases together: component discovery, container
//! creation, dependency wiring, route table compilation, and finally serving requests.

use crate::config::FrameworkConfig;
use crate::dispatcher::Dispatcher;
use crate::route::{RouteTable, RouterError};
use crate::server::{serve, serve_with_shutdown, ServerError};
use config::ConfigError;
use springlet_di::autowire::{autowire, UnresolvedDependencyPolicy};
use springlet_di::container::ComponentContainer;
use springlet_di::error::{ConflictError, DiscoveryError, WiringError};
use springlet_di::scanner::{ComponentDescriptor, ComponentScanner};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Errors related to bootstrapping the application.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Error discovering components: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("Error registering components: {0}")]
    Conflict(#[from] ConflictError),
    #[error("Error wiring dependencies: {0}")]
    Wiring(#[from] WiringError),
    #[error("Error building route table: {0}")]
    Router(#[from] RouterError),
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// A fully initialized application: all components instantiated and wired, all routes mapped.
/// Call [run](Self::run) to start serving requests.
pub struct Application {
    config: FrameworkConfig,
    container: ComponentContainer,
    dispatcher: Arc<Dispatcher>,
}

impl Application {
    /// Runs the startup phases against the given configuration.
    pub fn new(config: FrameworkConfig) -> Result<Self, ApplicationError> {
        info!("Initializing application; scanning {}.", config.scan_package);

        let definitions = ComponentScanner::new(&config.scan_package)
            .scan()?
            .map(ComponentDescriptor::into_definition);

        let container = ComponentContainer::from_definitions(definitions)?;

        let policy = if config.strict_wiring {
            UnresolvedDependencyPolicy::Strict
        } else {
            UnresolvedDependencyPolicy::Lenient
        };
        autowire(&container, policy)?;

        let routes = RouteTable::build(&container)?;

        info!(
            "Initialized {} components and {} routes.",
            container.len(),
            routes.len()
        );

        Ok(Self {
            config,
            container,
            dispatcher: Arc::new(Dispatcher::new(routes)),
        })
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn container(&self) -> &ComponentContainer {
        &self.container
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Starts serving requests until the process terminates.
    pub async fn run(&self) -> Result<(), ApplicationError> {
        serve(self.dispatcher.clone(), &self.config.server)
            .await
            .map_err(Into::into)
    }

    /// Starts serving requests until the given future completes.
    pub async fn run_until<F: Future<Output = ()>>(
        &self,
        shutdown: F,
    ) -> Result<(), ApplicationError> {
        serve_with_shutdown(self.dispatcher.clone(), &self.config.server, shutdown)
            .await
            .map_err(Into::into)
    }
}

/// Creates an application from the default configuration sources, installing a default tracing
/// logger if configured to do so.
pub fn create_default() -> Result<Application, ApplicationError> {
    let config = FrameworkConfig::load()?;
    if config.install_tracing_logger {
        // ignore the error in case a logger has already been installed
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    Application::new(config)
}
