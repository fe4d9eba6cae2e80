/// Error reporting: every failure names the slot it is about.

use bootkit::{constructor, value, Address, Container, DiError, DiResult, StopFailure};
use std::error::Error;
use std::sync::Arc;

struct Config;
struct Repo;
struct Missing;
bootkit::injectable!(Config, Repo, Missing);

#[test]
fn test_error_display_not_initiated() {
    let error = DiError::NotInitiated(Address::new("app.Repo"));
    assert_eq!(error.to_string(), "dependency app.Repo not initiated");
    assert_eq!(error.address(), Some("app.Repo"));
}

#[test]
fn test_error_display_cycle() {
    let error = DiError::Cycle {
        path: vec!["app.A".into(), "app.B".into(), "app.A".into()],
    };
    let display = error.to_string();
    assert!(display.starts_with("dependency graph calculation failed"));
    assert!(display.contains("app.A -> app.B -> app.A"));
}

#[test]
fn test_error_display_stop_lists_every_failure() {
    let error = DiError::Stop(vec![
        StopFailure {
            service: "app.Cache".to_string(),
            error: anyhow::anyhow!("flush failed"),
        },
        StopFailure {
            service: "app.Db".to_string(),
            error: anyhow::anyhow!("socket closed"),
        },
    ]);
    assert_eq!(
        error.to_string(),
        "2 service(s) failed to stop: app.Cache: flush failed; app.Db: socket closed"
    );
}

#[test]
fn test_hook_errors_are_sources() {
    let error = DiError::Constructor {
        address: Address::new("fn() -> app.Repo#1"),
        source: anyhow::anyhow!("disk full"),
    };
    assert_eq!(error.hook_error().map(|e| e.to_string()), Some("disk full".to_string()));
    assert!(error.source().is_some());
    assert!(DiError::NotStarted.source().is_none());
}

#[test]
fn test_result_alias() {
    fn fails() -> DiResult<u8> {
        Err(DiError::AlreadyStarted)
    }
    assert!(matches!(fails(), Err(DiError::AlreadyStarted)));
}

#[test]
fn test_duplicate_values_fail_the_start() {
    let container = Container::new();
    container.register([value(Config)]).unwrap();
    container.register([value(Config)]).unwrap();

    let err = container.start().unwrap_err();
    match &err {
        DiError::AlreadyInitiated(address) => assert!(address.as_str().ends_with(".Config")),
        other => panic!("unexpected: {:?}", other),
    }
    assert!(err.to_string().contains("already initiated"));
    assert!(!container.is_running());
    // the first value stays
    assert_eq!(container.descriptors().len(), Container::new().len() + 1);

    // the duplicate keeps failing every start
    container.stop().unwrap();
    assert!(matches!(container.start(), Err(DiError::AlreadyInitiated(_))));
}

#[test]
fn test_constructor_output_colliding_with_a_value_fails_the_start() {
    let container = Container::new();
    container
        .register([value(Repo), constructor(|| Repo)])
        .unwrap();
    let err = container.start().unwrap_err();
    assert!(matches!(err, DiError::AlreadyInitiated(ref a) if a.as_str().ends_with(".Repo")));
}

#[test]
fn test_two_constructors_for_one_output_fail_the_start() {
    let container = Container::new();
    container
        .register([constructor(|| Repo), constructor(|| Repo)])
        .unwrap();
    assert!(matches!(
        container.start(),
        Err(DiError::AlreadyInitiated(_))
    ));
}

#[test]
fn test_unregistered_parameter_is_not_initiated() {
    let container = Container::new();
    container
        .register([constructor(|_: Arc<Missing>| Repo)])
        .unwrap();
    let err = container.start().unwrap_err();
    match err {
        DiError::NotInitiated(address) => assert!(address.as_str().ends_with(".Missing")),
        other => panic!("unexpected: {:?}", other),
    }
    assert!(!container.is_running());
}

#[test]
fn test_error_parameters_are_unsupported() {
    let container = Container::new();
    container.start().unwrap();
    let err = container.invoke(|_: Arc<std::io::Error>| {}).unwrap_err();
    assert!(matches!(err, DiError::Unsupported { .. }));
}

#[test]
fn test_callable_parameters_are_unsupported() {
    let container = Container::new();
    container
        .register([constructor(|_: Arc<fn(u8) -> u8>| Repo)])
        .unwrap();
    let err = container.start().unwrap_err();
    match err {
        DiError::Unsupported { type_name } => assert!(type_name.contains("fn(u8)")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_constructor_errors_abort_the_start() {
    let container = Container::new();
    container
        .register([
            value(Config),
            constructor(|_: Arc<Config>| -> anyhow::Result<Repo> {
                anyhow::bail!("migration failed")
            }),
        ])
        .unwrap();

    let err = container.start().unwrap_err();
    match &err {
        DiError::Constructor { address, source } => {
            assert!(address.as_str().starts_with("fn("));
            assert!(address.as_str().contains('#'));
            assert_eq!(source.to_string(), "migration failed");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(err.to_string().contains("migration failed"));
}

#[test]
fn test_io_errors_convert_through_the_error_channel() {
    let container = Container::new();
    container
        .register([constructor(|| -> Result<Repo, std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
        })])
        .unwrap();
    let err = container.start().unwrap_err();
    assert_eq!(err.hook_error().unwrap().to_string(), "no such file");
}

#[test]
fn test_invoke_returns_the_callable_error() {
    let container = Container::new();
    container.start().unwrap();
    let err = container
        .invoke(|| -> anyhow::Result<()> { anyhow::bail!("nope") })
        .unwrap_err();
    assert!(matches!(err, DiError::Constructor { .. }));
}

#[test]
fn test_second_start_is_rejected() {
    let container = Container::new();
    container.start().unwrap();
    assert!(matches!(container.start(), Err(DiError::AlreadyStarted)));
    container.stop().unwrap();
    container.start().unwrap();
}
