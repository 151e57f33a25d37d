//! The basic building block of the container is a [ComponentDefinition]. Components are
//! injectable, default-constructible objects which can themselves contain dependencies to other
//! components, expressed as [Injected] fields.
//!
//! Instead of runtime type inspection, every component describes itself with an explicit
//! [ComponentDefinition]: which role it plays, under which name it should be registered, which
//! capabilities (trait contracts) it satisfies, and which of its fields should be autowired. The
//! definition carries plain function pointers for construction and type-erased casting, so the
//! container never needs to look anything up dynamically per request.
//!
//! ```
//! use springlet_di::capability;
//! use springlet_di::component::{inject_field, ComponentDefinition, Injected};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct GreetingConsumer {
//!     greeter: Injected<dyn Greeter>,
//! }
//!
//! let _greeter = ComponentDefinition::service::<EnglishGreeter>()
//!     .with_capability(capability!(EnglishGreeter => dyn Greeter));
//!
//! let _consumer = ComponentDefinition::service::<GreetingConsumer>()
//!     .named("greetingConsumer")
//!     .with_injected_field(inject_field(
//!         "greeter",
//!         None,
//!         |consumer: &GreetingConsumer| &consumer.greeter,
//!     ));
//! ```

use crate::container::RegisteredComponent;
use crate::error::WiringError;
use derivative::Derivative;
use std::any::{type_name, Any};
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};

/// Shared pointer under which all component instances live for the process lifetime.
pub type ComponentInstancePtr<T> = Arc<T>;

/// Type-erased component instance, as stored by the container.
pub type ComponentInstanceAnyPtr = ComponentInstancePtr<dyn Any + Send + Sync + 'static>;

/// Cast function which tries to downcast a type-erased instance to a concrete
/// [ComponentInstancePtr] or a trait object pointer. On success the result contains a boxed
/// `ComponentInstancePtr<T>` for the target type, which callers downcast back from `dyn Any`.
pub type CastFunction =
    fn(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr>;

/// Declared role of a component.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ComponentRole {
    /// Exposes externally routable actions grouped under a common path prefix. Handler groups are
    /// tracked by the container, but other components do not look them up by name.
    HandlerGroup,
    /// Provides behavior to other components via dependency injection, optionally under one or
    /// more capability contracts.
    Service,
}

/// A named capability (trait contract) a component satisfies, together with the cast function
/// producing the matching trait object pointer. Usually created with the [capability!](crate::capability)
/// macro rather than by hand.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct CapabilityDefinition {
    pub name: &'static str,

    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

pub(crate) type ApplyFn = Box<
    dyn Fn(&(dyn Any + Send + Sync), &RegisteredComponent) -> Result<(), WiringError>
        + Send
        + Sync,
>;

/// A single injectable field of a component: which field, which dependency name it requires
/// (explicit override or the default derived from the dependency type), and how to assign a
/// resolved dependency onto the constructed instance. Created with [inject_field].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct InjectionPoint {
    pub field: &'static str,
    pub dependency_name: Option<&'static str>,
    pub default_name: &'static str,

    #[derivative(Debug = "ignore")]
    pub(crate) apply: ApplyFn,
}

impl InjectionPoint {
    /// The registry name this injection point resolves to.
    pub fn target_name(&self) -> &str {
        self.dependency_name.unwrap_or(self.default_name)
    }
}

/// Explicit registration information for a component: the static configuration a declarative
/// framework would read from attached metadata, expressed as a plain struct with a builder API.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ComponentDefinition {
    /// Fully-qualified type name, used for discovery and default-name derivation.
    pub type_name: &'static str,

    pub role: ComponentRole,

    /// Explicit name override. When absent, the name derives from the type name via
    /// [default_component_name].
    pub name: Option<&'static str>,

    /// Zero-argument constructor for the component instance.
    #[derivative(Debug = "ignore")]
    pub constructor: fn() -> ComponentInstanceAnyPtr,

    /// Cast back to the concrete component type.
    #[derivative(Debug = "ignore")]
    pub self_cast: CastFunction,

    pub capabilities: Vec<CapabilityDefinition>,

    pub injection_points: Vec<InjectionPoint>,
}

impl ComponentDefinition {
    /// Creates a definition for a [Service](ComponentRole::Service) component.
    pub fn service<C: Default + Send + Sync + 'static>() -> Self {
        Self::with_role::<C>(ComponentRole::Service)
    }

    /// Creates a definition for a [HandlerGroup](ComponentRole::HandlerGroup) component.
    pub fn handler_group<C: Default + Send + Sync + 'static>() -> Self {
        Self::with_role::<C>(ComponentRole::HandlerGroup)
    }

    fn with_role<C: Default + Send + Sync + 'static>(role: ComponentRole) -> Self {
        Self {
            type_name: type_name::<C>(),
            role,
            name: None,
            constructor: construct::<C>,
            self_cast: self_cast::<C>,
            capabilities: Vec::new(),
            injection_points: Vec::new(),
        }
    }

    /// Overrides the derived component name with an explicit one.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Declares a capability this component satisfies.
    pub fn with_capability(mut self, capability: CapabilityDefinition) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Declares an injectable field to be autowired after all components exist.
    pub fn with_injected_field(mut self, point: InjectionPoint) -> Self {
        self.injection_points.push(point);
        self
    }

    /// The name under which the container registers this component.
    pub fn resolved_name(&self) -> String {
        self.name
            .map(ToString::to_string)
            .unwrap_or_else(|| default_component_name(self.type_name))
    }
}

fn construct<C: Default + Send + Sync + 'static>() -> ComponentInstanceAnyPtr {
    ComponentInstancePtr::new(C::default())
}

fn self_cast<C: Send + Sync + 'static>(
    instance: ComponentInstanceAnyPtr,
) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    instance.downcast::<C>().map(|p| Box::new(p) as Box<dyn Any>)
}

/// Derives the default component name from a fully-qualified type name: the last path segment
/// with the first character lowercased, e.g. `demo::FortuneService` becomes `fortuneService`.
/// Default-name dependency lookups rely on this exact transformation.
pub fn default_component_name(type_name: &str) -> String {
    let simple = type_name.rsplit("::").next().unwrap_or(type_name);
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// A once-settable slot for an autowired dependency. Components declare their dependencies as
/// `Injected<T>` fields (with `T` a concrete component type or a `dyn Trait` capability),
/// constructed empty and bound by the autowiring phase. An unresolved dependency leaves the slot
/// empty, so [get](Injected::get) returns `None`.
pub struct Injected<T: ?Sized + 'static> {
    slot: OnceLock<ComponentInstancePtr<T>>,
}

impl<T: ?Sized + 'static> Injected<T> {
    pub fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Returns the bound dependency, or `None` when autowiring did not resolve it.
    pub fn get(&self) -> Option<&ComponentInstancePtr<T>> {
        self.slot.get()
    }

    fn bind(&self, instance: ComponentInstancePtr<T>) {
        // binding runs once at startup; a duplicate declaration for the same field is a no-op
        let _ = self.slot.set(instance);
    }
}

impl<T: ?Sized + 'static> Default for Injected<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Debug for Injected<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("dependency", &type_name::<T>())
            .field("bound", &self.slot.get().is_some())
            .finish()
    }
}

/// Creates an [InjectionPoint] for field `field` of component `C`, holding a dependency of type
/// `T`. With no explicit `dependency_name`, the target name defaults to the fully-qualified name
/// of `T`, which is how services register their capability contracts.
pub fn inject_field<C, T>(
    field: &'static str,
    dependency_name: Option<&'static str>,
    accessor: fn(&C) -> &Injected<T>,
) -> InjectionPoint
where
    C: Send + Sync + 'static,
    T: ?Sized + 'static,
{
    InjectionPoint {
        field,
        dependency_name,
        default_name: type_name::<T>(),
        apply: Box::new(move |target, dependency| {
            let component = target.downcast_ref::<C>().ok_or_else(|| {
                WiringError::InvalidInjectionTarget {
                    component: type_name::<C>().to_string(),
                    field,
                }
            })?;
            let instance = dependency.instance_as::<T>().ok_or_else(|| {
                WiringError::IncompatibleDependency {
                    component: type_name::<C>().to_string(),
                    field,
                    dependency: dependency.name.clone(),
                }
            })?;

            accessor(component).bind(instance);
            Ok(())
        }),
    }
}

/// Creates a [CapabilityDefinition] registering a concrete component type under a trait contract.
///
/// ```
/// use springlet_di::capability;
///
/// trait Contract: Send + Sync {}
///
/// #[derive(Default)]
/// struct Implementation;
///
/// impl Contract for Implementation {}
///
/// let capability = capability!(Implementation => dyn Contract);
/// assert_eq!(capability.name, std::any::type_name::<dyn Contract>());
/// ```
#[macro_export]
macro_rules! capability {
    ($concrete:ty => $contract:ty) => {
        $crate::capability!(::std::any::type_name::<$contract>(), $concrete => $contract)
    };
    ($name:expr, $concrete:ty => $contract:ty) => {{
        fn cast(
            instance: $crate::component::ComponentInstanceAnyPtr,
        ) -> ::std::result::Result<
            ::std::boxed::Box<dyn ::std::any::Any>,
            $crate::component::ComponentInstanceAnyPtr,
        > {
            instance.downcast::<$concrete>().map(|p| {
                ::std::boxed::Box::new(p as $crate::component::ComponentInstancePtr<$contract>)
                    as ::std::boxed::Box<dyn ::std::any::Any>
            })
        }

        $crate::component::CapabilityDefinition { name: $name, cast }
    }};
}

#[cfg(test)]
mod tests {
    use crate::component::{
        default_component_name, ComponentDefinition, ComponentInstancePtr, ComponentRole, Injected,
    };

    trait TestContract: Send + Sync {
        fn value(&self) -> i32;
    }

    #[derive(Default)]
    struct TestComponent;

    impl TestContract for TestComponent {
        fn value(&self) -> i32 {
            42
        }
    }

    #[test]
    fn should_lowercase_first_letter_of_simple_name() {
        assert_eq!(
            default_component_name("demo::service::FortuneService"),
            "fortuneService"
        );
        assert_eq!(default_component_name("Simple"), "simple");
        assert_eq!(default_component_name("lower"), "lower");
        assert_eq!(default_component_name(""), "");
    }

    #[test]
    fn should_derive_resolved_name_from_type() {
        let definition = ComponentDefinition::service::<TestComponent>();
        assert_eq!(definition.resolved_name(), "testComponent");
        assert_eq!(definition.role, ComponentRole::Service);
    }

    #[test]
    fn should_prefer_explicit_name() {
        let definition = ComponentDefinition::service::<TestComponent>().named("explicit");
        assert_eq!(definition.resolved_name(), "explicit");
    }

    #[test]
    fn should_cast_capability_to_contract() {
        let capability = capability!(TestComponent => dyn TestContract);
        let instance = (ComponentDefinition::service::<TestComponent>().constructor)();

        let boxed = (capability.cast)(instance).unwrap();
        let contract = boxed
            .downcast::<ComponentInstancePtr<dyn TestContract>>()
            .unwrap();
        assert_eq!(contract.value(), 42);
    }

    #[test]
    fn should_start_with_empty_injected_slot() {
        let injected: Injected<dyn TestContract> = Injected::new();
        assert!(injected.get().is_none());
    }
}
