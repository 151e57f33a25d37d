//! Route table construction. For every handler group in the container, each declared route is
//! compiled once into a [CompiledRoute]: an anchored match pattern built from the group prefix
//! and action path, plus the ordered parameter-index mapping the dispatcher uses to assemble
//! arguments. The table is immutable after startup and read concurrently by all requests.

use crate::handler_group::{
    Action, ActionArguments, BoxError, HandlerGroup, ParameterBinding, ParameterKind,
    RouteDefinition,
};
use fxhash::FxHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use springlet_di::component::ComponentRole;
use springlet_di::container::ComponentContainer;
use thiserror::Error;
use tracing::info;

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new("/+").expect("separator pattern is valid"));

/// Collapses runs of path separators to a single one. Idempotent: normalizing an already
/// normalized path yields the same path.
pub fn normalize_path(path: &str) -> String {
    SEPARATOR_RUNS.replace_all(path, "/").into_owned()
}

/// Errors related to building the route table.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Invalid route pattern '{path}': {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },
    #[error("Component '{0}' is registered as a handler group but does not expose the HandlerGroup contract")]
    MissingHandlerContract(String),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ParamSlot {
    pub index: usize,
    pub kind: ParameterKind,
}

/// A single compiled route: the match pattern, the owning group, the target action and the
/// parameter-index mapping. Immutable after construction.
pub struct CompiledRoute {
    pattern: Regex,
    path: String,
    group: String,
    action_name: &'static str,
    arity: usize,
    parameters: FxHashMap<String, ParamSlot>,
    request_index: Option<usize>,
    response_index: Option<usize>,
    action: Action,
}

impl CompiledRoute {
    fn compile(
        group: &str,
        base_path: &str,
        definition: RouteDefinition,
    ) -> Result<Self, RouterError> {
        let path = normalize_path(&format!("/{}/{}", base_path, definition.path));
        // full-string match, with the declared path treated as pattern syntax
        let pattern =
            Regex::new(&format!("^(?:{path})$")).map_err(|source| RouterError::InvalidPattern {
                path: path.clone(),
                source,
            })?;

        let arity = definition.parameters.len();
        let mut parameters = FxHashMap::default();
        let mut request_index = None;
        let mut response_index = None;

        for (index, binding) in definition.parameters.iter().enumerate() {
            match binding {
                ParameterBinding::Request => request_index = Some(index),
                ParameterBinding::Response => response_index = Some(index),
                ParameterBinding::Param { name, kind } => {
                    // a repeated declaration keeps the last occurrence
                    parameters.insert(name.to_string(), ParamSlot { index, kind: *kind });
                }
            }
        }

        Ok(Self {
            pattern,
            path,
            group: group.to_string(),
            action_name: definition.name,
            arity,
            parameters,
            request_index,
            response_index,
            action: definition.action,
        })
    }

    /// Whether the full normalized path matches this route's pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// The normalized full path pattern this route was compiled from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolved name of the owning handler group component.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn action_name(&self) -> &'static str {
        self.action_name
    }

    /// Declared arity of the target action.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub(crate) fn parameters(&self) -> &FxHashMap<String, ParamSlot> {
        &self.parameters
    }

    pub(crate) fn request_index(&self) -> Option<usize> {
        self.request_index
    }

    pub(crate) fn response_index(&self) -> Option<usize> {
        self.response_index
    }

    pub(crate) fn invoke(
        &self,
        arguments: ActionArguments<'_>,
    ) -> Result<Option<String>, BoxError> {
        (self.action)(arguments)
    }
}

/// Ordered sequence of [CompiledRoute]s; insertion order is discovery order, and the first match
/// wins on lookup.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compiles one route per declared action of every handler group in the container, in
    /// container registration order. Only reads the container.
    pub fn build(container: &ComponentContainer) -> Result<Self, RouterError> {
        let mut routes = Vec::new();

        for component in container
            .components()
            .filter(|component| component.role == ComponentRole::HandlerGroup)
        {
            let group = component
                .instance_as::<dyn HandlerGroup>()
                .ok_or_else(|| RouterError::MissingHandlerContract(component.name.clone()))?;

            let base_path = group.base_path().to_string();
            for definition in group.routes() {
                let route = CompiledRoute::compile(&component.name, &base_path, definition)?;
                info!(
                    "Mapped: {} -> {}::{}",
                    route.path(),
                    component.type_name,
                    route.action_name()
                );
                routes.push(route);
            }
        }

        Ok(Self { routes })
    }

    /// Linear first-match scan in insertion order. Registration order decides between overlapping
    /// patterns, regardless of specificity.
    pub fn find(&self, path: &str) -> Option<&CompiledRoute> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
