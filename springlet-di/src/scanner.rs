//! Component discovery. Components register themselves at compile time with
//! [register_component!](crate::register_component), which records the registering module path as
//! the component's namespace. [ComponentScanner] then walks the registered entries under a
//! configured root namespace - the equivalent of scanning a package for component classes -
//! without instantiating anything.

use crate::component::ComponentDefinition;
use derivative::Derivative;
use tracing::debug;

/// A compile-time registration entry gathered by [inventory]. Submitted by
/// [register_component!](crate::register_component).
pub struct ComponentRegistrar {
    /// Module path of the registering code, used for namespace filtering.
    pub namespace: &'static str,

    /// Fully-qualified name of the component type. A function rather than a value, since the
    /// registrar itself must be constructible in const context.
    pub type_name: fn() -> &'static str,

    pub register: fn() -> ComponentDefinition,
}

inventory::collect!(ComponentRegistrar);

/// Submits a [ComponentRegistrar] for the given component type under the current module path.
///
/// ```
/// use springlet_di::component::ComponentDefinition;
/// use springlet_di::register_component;
///
/// #[derive(Default)]
/// struct ScannedComponent;
///
/// fn scanned_component() -> ComponentDefinition {
///     ComponentDefinition::service::<ScannedComponent>()
/// }
///
/// register_component!(ScannedComponent, scanned_component);
/// ```
#[macro_export]
macro_rules! register_component {
    ($component:ty, $register:expr) => {
        $crate::inventory::submit! {
            $crate::scanner::ComponentRegistrar {
                namespace: ::std::module_path!(),
                type_name: ::std::any::type_name::<$component>,
                register: $register,
            }
        }
    };
}

/// A discovered component's name and registration entry, produced by scanning and consumed during
/// instantiation.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct ComponentDescriptor {
    pub namespace: &'static str,
    pub type_name: &'static str,

    #[derivative(Debug = "ignore")]
    register: fn() -> ComponentDefinition,
}

impl ComponentDescriptor {
    /// Builds the full registration information for this component.
    pub fn into_definition(self) -> ComponentDefinition {
        (self.register)()
    }
}

/// Walks registered components under a root namespace.
pub struct ComponentScanner {
    root: String,
}

impl ComponentScanner {
    pub fn new<T: Into<String>>(root: T) -> Self {
        Self { root: root.into() }
    }

    /// Enumerates all components registered under the root namespace, in a finite,
    /// non-restartable sequence. Fails when the root namespace contains no registered components
    /// at all, which is fatal to startup.
    pub fn scan(
        &self,
    ) -> Result<impl Iterator<Item = ComponentDescriptor>, crate::error::DiscoveryError> {
        let descriptors: Vec<_> = inventory::iter::<ComponentRegistrar>
            .into_iter()
            .filter(|registrar| in_namespace(&self.root, registrar.namespace))
            .map(|registrar| ComponentDescriptor {
                namespace: registrar.namespace,
                type_name: (registrar.type_name)(),
                register: registrar.register,
            })
            .collect();

        if descriptors.is_empty() {
            return Err(crate::error::DiscoveryError::UnknownNamespace(
                self.root.clone(),
            ));
        }

        debug!(
            "Discovered {} component(s) under namespace '{}'",
            descriptors.len(),
            self.root
        );

        Ok(descriptors.into_iter())
    }
}

fn in_namespace(root: &str, namespace: &str) -> bool {
    namespace == root
        || namespace
            .strip_prefix(root)
            .map(|rest| rest.starts_with("::"))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentDefinition;
    use crate::error::DiscoveryError;
    use crate::scanner::{in_namespace, ComponentScanner};

    #[derive(Default)]
    struct ScannerTestComponent;

    fn scanner_test_component() -> ComponentDefinition {
        ComponentDefinition::service::<ScannerTestComponent>()
    }

    register_component!(ScannerTestComponent, scanner_test_component);

    #[test]
    fn should_match_namespace_prefixes_on_segment_boundaries() {
        assert!(in_namespace("demo", "demo"));
        assert!(in_namespace("demo", "demo::controller"));
        assert!(!in_namespace("demo", "demonstration"));
        assert!(!in_namespace("demo::controller", "demo"));
    }

    #[test]
    fn should_discover_components_under_root_namespace() {
        let scanner = ComponentScanner::new(module_path!());
        let descriptors: Vec<_> = scanner.scan().unwrap().collect();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(
            descriptors[0].type_name,
            std::any::type_name::<ScannerTestComponent>()
        );
    }

    #[test]
    fn should_fail_on_unknown_namespace() {
        let scanner = ComponentScanner::new("no::such::namespace");
        assert!(matches!(
            scanner.scan().map(|_| ()).unwrap_err(),
            DiscoveryError::UnknownNamespace(..)
        ));
    }
}
