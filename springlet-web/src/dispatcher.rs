//! Per-request dispatch: match the normalized path against the route table, assemble the
//! positional argument array, invoke the bound action and write the result. Request-phase
//! failures are isolated per request - the dispatcher writes a `500 Exception` body and the
//! process keeps serving.

use crate::handler_group::{ActionArgument, ActionArguments, BoxError, ParameterKind};
use crate::request::{WebRequest, WebResponse};
use crate::route::{normalize_path, CompiledRoute, RouteTable};
use std::num::ParseIntError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

const NOT_FOUND_BODY: &str = "404 not Found!";

/// Request-phase failures surfaced as a `500 Exception` body.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Cannot convert parameter '{name}' value '{value}' to an integer: {source}")]
    Conversion {
        name: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Action '{action}' failed: {source}")]
    Action {
        action: &'static str,
        source: BoxError,
    },
    #[error("Action '{action}' panicked: {detail}")]
    Panicked {
        action: &'static str,
        detail: String,
    },
}

/// Dispatches inbound requests against an immutable [RouteTable]. Invoked once per request by
/// the hosting server, potentially from many requests in parallel; holds no per-request state.
pub struct Dispatcher {
    routes: RouteTable,
}

impl Dispatcher {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Dispatches one request. Never fails: an unmatched path is a normal `404 not Found!`
    /// outcome, and every failure during a matched dispatch is caught here and written as a
    /// `500 Exception` body.
    pub fn dispatch(&self, request: &dyn WebRequest, response: &dyn WebResponse) {
        if let Err(error) = self.try_dispatch(request, response) {
            warn!("Request dispatch failed: {error}");
            response.write(&format!("500 Exception {error}"));
        }
    }

    fn try_dispatch(
        &self,
        request: &dyn WebRequest,
        response: &dyn WebResponse,
    ) -> Result<(), DispatchError> {
        let path = normalized_request_path(request);

        let Some(route) = self.routes.find(&path) else {
            debug!("No route matched '{path}'");
            response.write(NOT_FOUND_BODY);
            return Ok(());
        };

        debug!(
            "Dispatching '{path}' to {}::{}",
            route.group(),
            route.action_name()
        );

        let arguments = bind_arguments(route, request, response)?;
        let invoked = catch_unwind(AssertUnwindSafe(|| route.invoke(arguments)));

        match invoked {
            Ok(Ok(Some(body))) => {
                response.write(&body);
                Ok(())
            }
            Ok(Ok(None)) => Ok(()),
            Ok(Err(source)) => Err(DispatchError::Action {
                action: route.action_name(),
                source,
            }),
            Err(panic) => Err(DispatchError::Panicked {
                action: route.action_name(),
                detail: panic_detail(panic),
            }),
        }
    }
}

/// Strips the context prefix and collapses separator runs.
fn normalized_request_path(request: &dyn WebRequest) -> String {
    let path = request.path();
    let context = request.context_path();
    let stripped = if context.is_empty() {
        path
    } else {
        path.strip_prefix(context).unwrap_or(path)
    };

    normalize_path(stripped)
}

/// Builds the positional argument array of the action's declared arity: every incoming request
/// parameter whose name is mapped is converted and placed at its index, then the live carriers
/// are placed at theirs regardless of incoming parameters. Unmapped slots stay empty.
fn bind_arguments<'a>(
    route: &CompiledRoute,
    request: &'a dyn WebRequest,
    response: &'a dyn WebResponse,
) -> Result<ActionArguments<'a>, DispatchError> {
    let mut values = vec![ActionArgument::Empty; route.arity()];

    for (name, incoming) in request.parameters() {
        let Some(slot) = route.parameters().get(name) else {
            continue;
        };
        // multiple values for one name collapse to a comma-separated string
        let raw = incoming.join(",");
        values[slot.index] = convert(slot.kind, name, &raw)?;
    }

    if let Some(index) = route.request_index() {
        values[index] = ActionArgument::Request(request);
    }
    if let Some(index) = route.response_index() {
        values[index] = ActionArgument::Response(response);
    }

    Ok(ActionArguments::new(values))
}

/// Explicit conversion from an incoming string value to the declared parameter kind.
fn convert(
    kind: ParameterKind,
    name: &str,
    raw: &str,
) -> Result<ActionArgument<'static>, DispatchError> {
    match kind {
        ParameterKind::Text => Ok(ActionArgument::Text(raw.to_string())),
        ParameterKind::Integer => raw
            .parse::<i32>()
            .map(ActionArgument::Integer)
            .map_err(|source| DispatchError::Conversion {
                name: name.to_string(),
                value: raw.to_string(),
                source,
            }),
    }
}

fn panic_detail(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(detail) = panic.downcast_ref::<&str>() {
        (*detail).to_string()
    } else if let Some(detail) = panic.downcast_ref::<String>() {
        detail.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatcher::Dispatcher;
    use crate::handler_group::{
        action, handler_group_capability, HandlerGroup, ParameterBinding, ParameterKind,
        RouteDefinition,
    };
    use crate::request::{MockWebRequest, MockWebResponse, ParameterMap};
    use crate::route::RouteTable;
    use mockall::predicate::eq;
    use springlet_di::component::ComponentDefinition;
    use springlet_di::container::ComponentContainer;

    #[derive(Default)]
    struct CalculatorGroup;

    impl HandlerGroup for CalculatorGroup {
        fn base_path(&self) -> &str {
            "/calc"
        }

        fn routes(&self) -> Vec<RouteDefinition> {
            vec![
                RouteDefinition::new(
                    "add",
                    "/add",
                    vec![
                        ParameterBinding::Param {
                            name: "a",
                            kind: ParameterKind::Integer,
                        },
                        ParameterBinding::Param {
                            name: "b",
                            kind: ParameterKind::Integer,
                        },
                    ],
                    action(|arguments| {
                        let a = arguments.integer(0)?;
                        let b = arguments.integer(1)?;
                        Ok(Some(format!("{a}+{b}={}", a + b)))
                    }),
                ),
                RouteDefinition::new(
                    "echo",
                    "/echo",
                    vec![
                        ParameterBinding::Response,
                        ParameterBinding::Param {
                            name: "text",
                            kind: ParameterKind::Text,
                        },
                    ],
                    action(|arguments| {
                        arguments.response(0)?.write(arguments.text(1)?);
                        Ok(None)
                    }),
                ),
                RouteDefinition::new(
                    "whoami",
                    "/whoami",
                    vec![ParameterBinding::Request],
                    action(|arguments| {
                        let request = arguments.request(0)?;
                        Ok(Some(format!("you asked for {}", request.path())))
                    }),
                ),
                RouteDefinition::new(
                    "panic",
                    "/panic",
                    Vec::new(),
                    action(|_| panic!("boom")),
                ),
            ]
        }
    }

    fn dispatcher() -> Dispatcher {
        let container = ComponentContainer::from_definitions([
            ComponentDefinition::handler_group::<CalculatorGroup>()
                .with_capability(handler_group_capability::<CalculatorGroup>()),
        ])
        .unwrap();

        Dispatcher::new(RouteTable::build(&container).unwrap())
    }

    fn request(path: &str, context_path: &str, parameters: &[(&str, &[&str])]) -> MockWebRequest {
        let parameters: ParameterMap = parameters
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|value| value.to_string()).collect(),
                )
            })
            .collect();

        let mut request = MockWebRequest::new();
        request.expect_path().return_const(path.to_string());
        request
            .expect_context_path()
            .return_const(context_path.to_string());
        request.expect_parameters().return_const(parameters);
        request
    }

    #[test]
    fn should_convert_and_bind_integer_parameters() {
        let request = request("/calc/add", "", &[("a", &["3"]), ("b", &["4"])]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .with(eq("3+4=7"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_write_not_found_body_for_unmatched_path() {
        let request = request("/calc/unknown", "", &[]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .with(eq("404 not Found!"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_strip_context_path_and_collapse_separators() {
        let request = request("/app/calc//add", "/app", &[("a", &["1"]), ("b", &["2"])]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .with(eq("1+2=3"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_write_exception_body_on_conversion_failure() {
        let request = request("/calc/add", "", &[("a", &["x"]), ("b", &["4"])]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .withf(|body: &str| body.starts_with("500 Exception"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_keep_serving_after_a_failed_request() {
        let dispatcher = dispatcher();

        let bad = request("/calc/add", "", &[("a", &["x"]), ("b", &["4"])]);
        let mut bad_response = MockWebResponse::new();
        bad_response
            .expect_write()
            .withf(|body: &str| body.starts_with("500 Exception"))
            .times(1)
            .return_const(());
        dispatcher.dispatch(&bad, &bad_response);

        let good = request("/calc/add", "", &[("a", &["3"]), ("b", &["4"])]);
        let mut good_response = MockWebResponse::new();
        good_response
            .expect_write()
            .with(eq("3+4=7"))
            .times(1)
            .return_const(());
        dispatcher.dispatch(&good, &good_response);
    }

    #[test]
    fn should_write_exception_body_for_missing_declared_parameter() {
        // declared parameter absent from the request stays unbound; a typed accessor surfaces it
        let request = request("/calc/add", "", &[("b", &["4"])]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .withf(|body: &str| body.starts_with("500 Exception"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_join_multiple_values_with_commas() {
        let request = request("/calc/echo", "", &[("text", &["a", "b"])]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .with(eq("a,b"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_let_actions_write_through_the_response_carrier() {
        let request = request("/calc/echo", "", &[("text", &["hello"])]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .with(eq("hello"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_let_actions_read_through_the_request_carrier() {
        let request = request("/calc/whoami", "", &[]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .with(eq("you asked for /calc/whoami"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }

    #[test]
    fn should_recover_from_action_panic() {
        let request = request("/calc/panic", "", &[]);
        let mut response = MockWebResponse::new();
        response
            .expect_write()
            .withf(|body: &str| body.starts_with("500 Exception") && body.contains("boom"))
            .times(1)
            .return_const(());

        dispatcher().dispatch(&request, &response);
    }
}
