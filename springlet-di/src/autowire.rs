//! Dependency binding. Runs exactly once, after all components exist, so the result does not
//! depend on registration order: every [Injected](crate::component::Injected) field declared by a
//! registered component is resolved against the container and bound in place.

use crate::container::ComponentContainer;
use crate::error::WiringError;
use tracing::{debug, warn};

/// What to do when an injectable field's target name is absent from the container.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, Debug)]
pub enum UnresolvedDependencyPolicy {
    /// Leave the field empty and log a warning. This reproduces the observed behavior of leaving
    /// unresolved fields unset, which is a documented design weakness rather than a contract.
    #[default]
    Lenient,
    /// Fail startup with [WiringError::UnresolvedDependency].
    Strict,
}

/// Binds every injectable field of every registered component. The target name is the field's
/// explicit override when present, or the fully-qualified name of the dependency type otherwise.
/// A resolvable dependency of an incompatible type is always fatal, regardless of policy.
pub fn autowire(
    container: &ComponentContainer,
    policy: UnresolvedDependencyPolicy,
) -> Result<(), WiringError> {
    for component in container.components() {
        for point in component.injection_points() {
            let target = point.target_name();
            match container.get(target) {
                Some(dependency) => {
                    debug!(
                        "Autowired '{}' into field '{}' of '{}'",
                        target, point.field, component.name
                    );
                    (point.apply)(&*component.instance, dependency)?;
                }
                None if policy == UnresolvedDependencyPolicy::Strict => {
                    return Err(WiringError::UnresolvedDependency {
                        component: component.name.clone(),
                        field: point.field,
                        dependency: target.to_string(),
                    });
                }
                None => {
                    warn!(
                        "Cannot resolve dependency '{}' for field '{}' of '{}' - leaving it empty",
                        target, point.field, component.name
                    );
                }
            }
        }
    }

    Ok(())
}
