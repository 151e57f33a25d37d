use springlet_di::autowire::{autowire, UnresolvedDependencyPolicy};
use springlet_di::capability;
use springlet_di::component::{inject_field, ComponentDefinition, Injected};
use springlet_di::container::ComponentContainer;
use springlet_di::register_component;
use springlet_di::scanner::{ComponentDescriptor, ComponentScanner};
use std::sync::Arc;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Default)]
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        1234
    }
}

#[derive(Default)]
struct Scheduler {
    clock: Injected<dyn Clock>,
}

fn fixed_clock() -> ComponentDefinition {
    ComponentDefinition::service::<FixedClock>()
        .with_capability(capability!(FixedClock => dyn Clock))
}

fn scheduler() -> ComponentDefinition {
    ComponentDefinition::service::<Scheduler>().with_injected_field(inject_field(
        "clock",
        None,
        |scheduler: &Scheduler| &scheduler.clock,
    ))
}

register_component!(FixedClock, fixed_clock);
register_component!(Scheduler, scheduler);

#[test]
fn should_scan_instantiate_and_autowire() {
    let scanner = ComponentScanner::new(module_path!());
    let definitions = scanner
        .scan()
        .unwrap()
        .map(ComponentDescriptor::into_definition);
    let container = ComponentContainer::from_definitions(definitions).unwrap();

    autowire(&container, UnresolvedDependencyPolicy::Strict).unwrap();

    let scheduler = container.instance_by_name::<Scheduler>("scheduler").unwrap();
    assert_eq!(scheduler.clock.get().unwrap().now(), 1234);

    // singleton property: the clock injected into the scheduler is the registered instance
    let clock = container
        .instance_by_name::<dyn Clock>(std::any::type_name::<dyn Clock>())
        .unwrap();
    assert!(Arc::ptr_eq(scheduler.clock.get().unwrap(), &clock));
}

#[test]
fn should_build_independent_containers_from_the_same_definitions() {
    let definitions = || {
        ComponentScanner::new(module_path!())
            .scan()
            .unwrap()
            .map(ComponentDescriptor::into_definition)
    };

    let first = ComponentContainer::from_definitions(definitions()).unwrap();
    let second = ComponentContainer::from_definitions(definitions()).unwrap();

    let first_clock = first.instance_by_name::<FixedClock>("fixedClock").unwrap();
    let second_clock = second.instance_by_name::<FixedClock>("fixedClock").unwrap();
    assert!(!Arc::ptr_eq(&first_clock, &second_clock));
}
