//! A small demo application with one service and one handler group. Configure with e.g.
//! `SPRINGLET_SCAN_PACKAGE=00_demo_app cargo run --example 00-demo-app`, then query
//! `/demo/query?name=World` or `/demo/add?a=3&b=4`.

use springlet_di::capability;
use springlet_di::component::{inject_field, ComponentDefinition, Injected};
use springlet_di::register_component;
use springlet_web::application;
use springlet_web::handler_group::{
    action, handler_group_capability, ActionArguments, HandlerGroup, ParameterBinding,
    ParameterKind, RouteDefinition,
};
use tracing::info;

trait DemoService: Send + Sync {
    fn describe(&self, name: &str) -> String;
}

#[derive(Default)]
struct FortuneService;

impl DemoService for FortuneService {
    fn describe(&self, name: &str) -> String {
        format!("{name} will have a great day")
    }
}

register_component!(FortuneService, || {
    ComponentDefinition::service::<FortuneService>()
        .with_capability(capability!(FortuneService => dyn DemoService))
});

#[derive(Default)]
struct DemoHandlers {
    demo_service: Injected<dyn DemoService>,
}

impl HandlerGroup for DemoHandlers {
    fn base_path(&self) -> &str {
        "/demo"
    }

    fn routes(&self) -> Vec<RouteDefinition> {
        let service = self.demo_service.get().cloned();
        vec![
            RouteDefinition::new(
                "query",
                "/query",
                vec![
                    ParameterBinding::Request,
                    ParameterBinding::Response,
                    ParameterBinding::Param {
                        name: "name",
                        kind: ParameterKind::Text,
                    },
                ],
                action(move |arguments: ActionArguments<'_>| {
                    let service = service.as_ref().ok_or("demo service not wired")?;
                    arguments
                        .response(1)?
                        .write(&service.describe(arguments.text(2)?));
                    Ok(None)
                }),
            ),
            RouteDefinition::new(
                "add",
                "/add",
                vec![
                    ParameterBinding::Request,
                    ParameterBinding::Response,
                    ParameterBinding::Param {
                        name: "a",
                        kind: ParameterKind::Integer,
                    },
                    ParameterBinding::Param {
                        name: "b",
                        kind: ParameterKind::Integer,
                    },
                ],
                action(|arguments: ActionArguments<'_>| {
                    let (a, b) = (arguments.integer(2)?, arguments.integer(3)?);
                    arguments.response(1)?.write(&format!("{a}+{b}={}", a + b));
                    Ok(None)
                }),
            ),
            RouteDefinition::new(
                "remove",
                "/remove",
                vec![
                    ParameterBinding::Request,
                    ParameterBinding::Response,
                    ParameterBinding::Param {
                        name: "id",
                        kind: ParameterKind::Integer,
                    },
                ],
                action(|arguments: ActionArguments<'_>| {
                    let id = arguments.integer(2)?;
                    info!("Removing entity {id}.");
                    arguments.response(1)?.write(&format!("removed {id}"));
                    Ok(None)
                }),
            ),
        ]
    }
}

register_component!(DemoHandlers, || {
    ComponentDefinition::handler_group::<DemoHandlers>()
        .with_capability(handler_group_capability::<DemoHandlers>())
        .with_injected_field(inject_field(
            "demo_service",
            None,
            |group: &DemoHandlers| &group.demo_service,
        ))
});

#[tokio::main]
async fn main() {
    let application = application::create_default().expect("error bootstrapping application");
    application.run().await.expect("server error");
}
