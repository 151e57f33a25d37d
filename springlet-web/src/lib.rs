//! A minimal component-based web framework. Applications are built from explicitly registered
//! components of two roles: *services*, plain wired dependencies, and *handler groups*, which
//! declare routes bound to directly callable actions. Startup runs a fixed sequence of phases -
//! discovery, container creation, dependency wiring, route compilation - and any error in any
//! phase aborts startup. After startup everything is immutable and requests are dispatched
//! against a read-only route table.
//!
//! Example usage:
//!
//! ```no_run
//! use springlet_di::capability;
//! use springlet_di::component::{inject_field, ComponentDefinition, Injected};
//! use springlet_di::register_component;
//! use springlet_web::application;
//! use springlet_web::handler_group::{
//!     action, handler_group_capability, ActionArguments, HandlerGroup, ParameterBinding,
//!     ParameterKind, RouteDefinition,
//! };
//!
//! trait GreetingService: Send + Sync {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! #[derive(Default)]
//! struct SimpleGreetingService;
//!
//! impl GreetingService for SimpleGreetingService {
//!     fn greet(&self, name: &str) -> String {
//!         format!("Hello, {name}!")
//!     }
//! }
//!
//! register_component!(SimpleGreetingService, || {
//!     ComponentDefinition::service::<SimpleGreetingService>()
//!         .with_capability(capability!(SimpleGreetingService => dyn GreetingService))
//! });
//!
//! #[derive(Default)]
//! struct GreetingHandlers {
//!     greeting_service: Injected<dyn GreetingService>,
//! }
//!
//! impl HandlerGroup for GreetingHandlers {
//!     fn base_path(&self) -> &str {
//!         "/greeting"
//!     }
//!
//!     fn routes(&self) -> Vec<RouteDefinition> {
//!         let service = self.greeting_service.get().cloned();
//!         vec![RouteDefinition::new(
//!             "greet",
//!             "/greet",
//!             vec![ParameterBinding::Param {
//!                 name: "name",
//!                 kind: ParameterKind::Text,
//!             }],
//!             action(move |arguments: ActionArguments<'_>| {
//!                 let service = service.as_ref().ok_or("greeting service not wired")?;
//!                 Ok(Some(service.greet(arguments.text(0)?)))
//!             }),
//!         )]
//!     }
//! }
//!
//! register_component!(GreetingHandlers, || {
//!     ComponentDefinition::handler_group::<GreetingHandlers>()
//!         .with_capability(handler_group_capability::<GreetingHandlers>())
//!         .with_injected_field(inject_field(
//!             "greeting_service",
//!             None,
//!             |group: &GreetingHandlers| &group.greeting_service,
//!         ))
//! });
//!
//! #[tokio::main]
//! async fn main() {
//!     // reads springlet.* and SPRINGLET_* env vars; scan_package must name this module tree
//!     let application = application::create_default().expect("error bootstrapping application");
//!     application.run().await.expect("server error");
//! }
//! ```
//!
//! Requests hitting `/greeting/greet?name=World` respond with `Hello, World!`.

pub mod application;
pub mod config;
pub mod dispatcher;
pub mod handler_group;
pub mod request;
pub mod route;
pub mod server;
