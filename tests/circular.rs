use bootkit::{constructor, template, value, Composite, Container, DiError, DiResult, Field, FieldValues};
use std::sync::Arc;

struct ServiceA;
struct ServiceB;
struct ServiceC;
bootkit::injectable!(ServiceA, ServiceB, ServiceC);

/// Helper: assert that `start` fails with a cycle visiting every `expected` name.
fn assert_cycle(container: &Container, expected: &[&str]) {
    match container.start() {
        Err(DiError::Cycle { path }) => {
            assert_eq!(path.first(), path.last(), "cycle path must be closed: {:?}", path);
            for name in expected {
                assert!(
                    path.iter().any(|node| node.contains(name)),
                    "cycle path missing '{}'; got: {:?}",
                    name,
                    path
                );
            }
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
    assert!(!container.is_running());
}

#[test]
fn test_self_circular_dependency() {
    let container = Container::new();
    container
        .register([constructor(|_: Arc<ServiceA>| ServiceA)])
        .unwrap();
    assert_cycle(&container, &["ServiceA"]);
}

#[test]
fn test_two_service_cycle() {
    let container = Container::new();
    container
        .register([
            constructor(|_: Arc<ServiceB>| ServiceA),
            constructor(|_: Arc<ServiceA>| ServiceB),
        ])
        .unwrap();
    assert_cycle(&container, &["ServiceA", "ServiceB"]);
}

#[test]
fn test_three_service_cycle() {
    let container = Container::new();
    container
        .register([
            constructor(|_: Arc<ServiceB>| ServiceA),
            constructor(|_: Arc<ServiceC>| ServiceB),
            constructor(|_: Arc<ServiceA>| ServiceC),
        ])
        .unwrap();
    assert_cycle(&container, &["ServiceA", "ServiceB", "ServiceC"]);
}

#[test]
fn test_cycle_message_names_graph_calculation() {
    let container = Container::new();
    container
        .register([
            constructor(|_: Arc<ServiceB>| ServiceA),
            constructor(|_: Arc<ServiceA>| ServiceB),
        ])
        .unwrap();
    let err = container.start().unwrap_err();
    assert!(err.to_string().contains("dependency graph calculation failed"));
}

#[test]
fn test_template_cycle_through_a_constructor() {
    struct Bundle {
        _c: Arc<ServiceC>,
    }
    bootkit::injectable!(Bundle);

    impl Composite for Bundle {
        fn fields() -> Vec<Field> {
            vec![bootkit::field::<ServiceC>("c")]
        }

        fn assemble(values: &mut FieldValues) -> DiResult<Self> {
            Ok(Bundle {
                _c: values.take("c")?,
            })
        }
    }

    let container = Container::new();
    container
        .register([
            template::<Bundle>(),
            constructor(|_: Arc<Bundle>| ServiceC),
        ])
        .unwrap();
    assert_cycle(&container, &["Bundle", "ServiceC"]);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let container = Container::new();
    container
        .register([
            value(ServiceA),
            constructor(|_: Arc<ServiceA>| ServiceB),
            constructor(|_: Arc<ServiceA>| ServiceC),
            constructor(|_: Arc<ServiceB>, _: Arc<ServiceC>| ()),
        ])
        .unwrap();
    container.start().unwrap();
}

#[test]
fn test_graph_order_puts_dependencies_first() {
    let container = Container::new();
    container
        .register([
            constructor(|_: Arc<ServiceB>| ServiceC),
            constructor(|_: Arc<ServiceA>| ServiceB),
            value(ServiceA),
        ])
        .unwrap();

    let order = container.graph().unwrap().order().unwrap();
    let position = |name: &str| {
        order
            .iter()
            .position(|a| a.as_str().ends_with(name))
            .unwrap()
    };
    assert!(position(".ServiceA") < position(".ServiceB"));
    assert!(position(".ServiceB") < position(".ServiceC"));
}
