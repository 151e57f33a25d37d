//! Functionality related to defining handler groups - components exposing externally routable
//! actions under a common path prefix - and their declarative route metadata.
//!
//! Routes are declared as plain [RouteDefinition] values returned from
//! [HandlerGroup::routes]: a path pattern, the action's formal parameter list in declaration
//! order, and the action itself as a direct callable. The route table builder compiles these
//! into matchable routes once at startup; nothing is looked up dynamically per request.

use crate::request::{WebRequest, WebResponse};
use springlet_di::component::{
    CapabilityDefinition, ComponentInstanceAnyPtr, ComponentInstancePtr,
};
use std::any::{type_name, Any};
use std::error::Error;
use thiserror::Error;

/// Main trait for components used as handler groups. Implementing components should register
/// with [handler_group_capability] so the route table builder can reach them through the
/// type-erased container.
pub trait HandlerGroup: Send + Sync + 'static {
    /// Group-level path prefix, prepended to every action-level path.
    fn base_path(&self) -> &str {
        ""
    }

    /// The declared routes of this group, in declaration order.
    fn routes(&self) -> Vec<RouteDefinition>;
}

/// The capability under which every handler group must register itself.
pub fn handler_group_capability<C: HandlerGroup>() -> CapabilityDefinition {
    CapabilityDefinition {
        name: type_name::<dyn HandlerGroup>(),
        cast: cast_handler_group::<C>,
    }
}

fn cast_handler_group<C: HandlerGroup>(
    instance: ComponentInstanceAnyPtr,
) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    instance.downcast::<C>().map(|p| {
        Box::new(p as ComponentInstancePtr<dyn HandlerGroup>) as Box<dyn Any>
    })
}

/// Declared type of a bound action parameter. Only primitive-like types are bindable by design.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ParameterKind {
    /// Identity conversion from the incoming string value.
    Text,
    /// `i32` parse of the incoming string value.
    Integer,
}

/// One formal parameter of an action, in declaration order.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParameterBinding {
    /// The live request carrier, bound by type regardless of incoming parameters.
    Request,
    /// The live response carrier, bound by type regardless of incoming parameters.
    Response,
    /// A named request parameter, converted to the declared kind.
    Param {
        name: &'static str,
        kind: ParameterKind,
    },
}

/// Errors produced by actions themselves.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A directly callable action. Returning `Ok(None)` means the action produced no textual result
/// and is expected to have written the response itself through its response carrier, if at all.
pub type Action =
    Box<dyn Fn(ActionArguments<'_>) -> Result<Option<String>, BoxError> + Send + Sync>;

/// Wraps a closure into an [Action].
pub fn action<F>(f: F) -> Action
where
    F: Fn(ActionArguments<'_>) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// A declared (path pattern -> action) binding. The path is itself match-pattern syntax: literal
/// segments work as-is, and embedded regex (capturing groups, alternations) is compiled verbatim.
pub struct RouteDefinition {
    /// Action name, used for startup logs and diagnostics.
    pub name: &'static str,
    pub path: &'static str,
    pub parameters: Vec<ParameterBinding>,
    pub action: Action,
}

impl RouteDefinition {
    pub fn new(
        name: &'static str,
        path: &'static str,
        parameters: Vec<ParameterBinding>,
        action: Action,
    ) -> Self {
        Self {
            name,
            path,
            parameters,
            action,
        }
    }
}

/// One slot of the positional argument array assembled for an action invocation.
#[derive(Clone)]
pub enum ActionArgument<'a> {
    /// Declared but not bound - e.g. a named parameter absent from the incoming request.
    Empty,
    Text(String),
    Integer(i32),
    Request(&'a dyn WebRequest),
    Response(&'a dyn WebResponse),
}

/// Errors accessing the assembled argument array from within an action.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ArgumentError {
    #[error("argument index {index} is out of range for an action of arity {arity}")]
    OutOfRange { index: usize, arity: usize },
    #[error("argument {index} is not bound - the request did not supply a mapped parameter")]
    Missing { index: usize },
    #[error("argument {index} is not a {expected}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
    },
}

/// The positional argument array of an action invocation, with typed accessors. Indices follow
/// the declared parameter order of the route.
pub struct ActionArguments<'a> {
    values: Vec<ActionArgument<'a>>,
}

impl<'a> ActionArguments<'a> {
    pub fn new(values: Vec<ActionArgument<'a>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, index: usize) -> Result<&ActionArgument<'a>, ArgumentError> {
        self.values.get(index).ok_or(ArgumentError::OutOfRange {
            index,
            arity: self.values.len(),
        })
    }

    /// The text parameter at `index`. An unbound slot is an error; use [opt_text](Self::opt_text)
    /// for parameters an action can accept as absent.
    pub fn text(&self, index: usize) -> Result<&str, ArgumentError> {
        match self.value(index)? {
            ActionArgument::Text(value) => Ok(value),
            ActionArgument::Empty => Err(ArgumentError::Missing { index }),
            _ => Err(ArgumentError::TypeMismatch {
                index,
                expected: "text parameter",
            }),
        }
    }

    /// The text parameter at `index`, or `None` when the request did not supply it.
    pub fn opt_text(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(ActionArgument::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn integer(&self, index: usize) -> Result<i32, ArgumentError> {
        match self.value(index)? {
            ActionArgument::Integer(value) => Ok(*value),
            ActionArgument::Empty => Err(ArgumentError::Missing { index }),
            _ => Err(ArgumentError::TypeMismatch {
                index,
                expected: "integer parameter",
            }),
        }
    }

    pub fn opt_integer(&self, index: usize) -> Option<i32> {
        match self.values.get(index) {
            Some(ActionArgument::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn request(&self, index: usize) -> Result<&'a dyn WebRequest, ArgumentError> {
        match self.value(index)? {
            ActionArgument::Request(request) => Ok(*request),
            _ => Err(ArgumentError::TypeMismatch {
                index,
                expected: "request carrier",
            }),
        }
    }

    pub fn response(&self, index: usize) -> Result<&'a dyn WebResponse, ArgumentError> {
        match self.value(index)? {
            ActionArgument::Response(response) => Ok(*response),
            _ => Err(ArgumentError::TypeMismatch {
                index,
                expected: "response carrier",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handler_group::{ActionArgument, ActionArguments, ArgumentError};

    #[test]
    fn should_access_bound_arguments_by_index() {
        let arguments = ActionArguments::new(vec![
            ActionArgument::Text("hello".to_string()),
            ActionArgument::Integer(3),
        ]);

        assert_eq!(arguments.text(0).unwrap(), "hello");
        assert_eq!(arguments.integer(1).unwrap(), 3);
        assert_eq!(arguments.opt_text(0), Some("hello"));
        assert_eq!(arguments.opt_integer(1), Some(3));
    }

    #[test]
    fn should_report_unbound_argument_as_missing() {
        let arguments = ActionArguments::new(vec![ActionArgument::Empty]);

        assert_eq!(
            arguments.text(0).unwrap_err(),
            ArgumentError::Missing { index: 0 }
        );
        assert_eq!(arguments.opt_text(0), None);
    }

    #[test]
    fn should_report_type_mismatch() {
        let arguments = ActionArguments::new(vec![ActionArgument::Integer(1)]);

        assert!(matches!(
            arguments.text(0).unwrap_err(),
            ArgumentError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn should_report_out_of_range_access() {
        let arguments = ActionArguments::new(Vec::new());

        assert_eq!(
            arguments.integer(2).unwrap_err(),
            ArgumentError::OutOfRange { index: 2, arity: 0 }
        );
    }
}
