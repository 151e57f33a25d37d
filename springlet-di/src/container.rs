//! The component container: instantiates discovered [ComponentDefinition]s exactly once,
//! classifies them by role and stores them under their resolved names. After the wiring phase
//! completes the container is read-only, which makes unsynchronized concurrent reads during
//! request handling safe.

use crate::component::{
    CapabilityDefinition, CastFunction, ComponentDefinition, ComponentInstanceAnyPtr,
    ComponentInstancePtr, ComponentRole, InjectionPoint,
};
use crate::error::ConflictError;
use fxhash::FxHashMap;
use tracing::debug;

/// A live component owned by the container.
pub struct RegisteredComponent {
    /// Resolved registration name: the explicit override, or the default derived from the type
    /// name.
    pub name: String,
    pub role: ComponentRole,
    pub type_name: &'static str,
    pub instance: ComponentInstanceAnyPtr,
    self_cast: CastFunction,
    capabilities: Vec<CapabilityDefinition>,
    pub(crate) injection_points: Vec<InjectionPoint>,
}

impl RegisteredComponent {
    /// Returns this component's instance as `ComponentInstancePtr<T>`, trying the concrete type
    /// first and then every declared capability contract. This mirrors dynamic assignment in
    /// reflective containers: a component looked up under its bean name can still be bound onto a
    /// trait-typed field, as long as it declares that capability.
    pub fn instance_as<T: ?Sized + 'static>(&self) -> Option<ComponentInstancePtr<T>> {
        let casts = std::iter::once(self.self_cast)
            .chain(self.capabilities.iter().map(|capability| capability.cast));

        for cast in casts {
            if let Ok(boxed) = cast(self.instance.clone()) {
                if let Ok(instance) = boxed.downcast::<ComponentInstancePtr<T>>() {
                    return Some(*instance);
                }
            }
        }

        None
    }

    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }
}

/// Mapping from resolved names (and, for services, capability names) to singleton component
/// instances. Created once at startup; component entries keep their registration order, which
/// becomes route-table discovery order.
#[derive(Default)]
pub struct ComponentContainer {
    components: Vec<RegisteredComponent>,
    names: FxHashMap<String, usize>,
}

impl ComponentContainer {
    /// Instantiates and registers all given definitions, in order. Each definition produces
    /// exactly one live instance for the container lifetime. Any conflict aborts the whole
    /// startup; there is no partial rollback.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, ConflictError>
    where
        I: IntoIterator<Item = ComponentDefinition>,
    {
        let mut container = Self::default();
        for definition in definitions {
            container.register(definition)?;
        }

        Ok(container)
    }

    fn register(&mut self, definition: ComponentDefinition) -> Result<(), ConflictError> {
        let name = definition.resolved_name();
        if self.names.contains_key(&name) {
            return Err(ConflictError::DuplicateComponentName(name));
        }

        let index = self.components.len();
        let instance = (definition.constructor)();

        debug!(
            "Registered {:?} '{}' of type {}",
            definition.role, name, definition.type_name
        );

        // only services expose themselves under capability names; handler groups are reached
        // through the route table, never by name lookup from other components
        if definition.role == ComponentRole::Service {
            for capability in &definition.capabilities {
                if let Some(existing) = self.names.get(capability.name) {
                    if *existing != index {
                        return Err(ConflictError::CapabilityAlreadyBound {
                            capability: capability.name.to_string(),
                            existing: self.components[*existing].name.clone(),
                        });
                    }
                }
                self.names.insert(capability.name.to_string(), index);
            }
        }

        self.names.insert(name.clone(), index);
        self.components.push(RegisteredComponent {
            name,
            role: definition.role,
            type_name: definition.type_name,
            instance,
            self_cast: definition.self_cast,
            capabilities: definition.capabilities,
            injection_points: definition.injection_points,
        });

        Ok(())
    }

    /// Pure lookup by resolved name or capability name.
    pub fn get(&self, name: &str) -> Option<&RegisteredComponent> {
        self.names.get(name).map(|index| &self.components[*index])
    }

    /// Typed lookup: the named component's instance under type `T`, which can be the concrete
    /// component type or any capability contract the component declares.
    pub fn instance_by_name<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Option<ComponentInstancePtr<T>> {
        self.get(name)?.instance_as::<T>()
    }

    /// All registered components, in registration order.
    pub fn components(&self) -> impl Iterator<Item = &RegisteredComponent> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
