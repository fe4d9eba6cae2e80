//! Application bootstrapper: runs a container through its phases as logged
//! steps.
//!
//! Phase order: **register → start → run → stop**. A phase only runs when
//! the previous one succeeded, except `stop`, which always runs once `start`
//! was attempted.

use std::time::Instant;

use crate::config::AppConfig;
use crate::container::Container;
use crate::provider::Item;

/// A container plus the items to register into it and a name to log under.
///
/// # Examples
///
/// ```
/// use bootkit::{constructor, value, AppConfig, Application};
/// use std::sync::Arc;
///
/// struct Greeting(&'static str);
/// struct Greeter(String);
/// bootkit::injectable!(Greeting, Greeter);
///
/// let mut app = Application::new(AppConfig::default());
/// app.provide([
///     value(Greeting("hello")),
///     constructor(|g: Arc<Greeting>| Greeter(g.0.to_uppercase())),
/// ]);
///
/// app.run(|container| {
///     let greeter = container.resolve::<Greeter>()?;
///     assert_eq!(greeter.0, "HELLO");
///     Ok(())
/// })
/// .unwrap();
/// ```
pub struct Application {
    config: AppConfig,
    container: Container,
    items: Vec<Item>,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        let container = Container::with_config(config.container.clone());
        Self {
            config,
            container,
            items: Vec::new(),
        }
    }

    /// Uses a prepared container instead of building one from the config.
    pub fn with_container(config: AppConfig, container: Container) -> Self {
        Self {
            config,
            container,
            items: Vec::new(),
        }
    }

    /// Queues items for the register phase.
    pub fn provide<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Item>,
    {
        self.items.extend(items);
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registers the queued items, starts the container, calls `main` and
    /// stops the container.
    ///
    /// Returns the first failure. A stop failure following an earlier
    /// failure is logged, not returned.
    pub fn run<F>(&mut self, main: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Container) -> anyhow::Result<()>,
    {
        let app = self.config.name.clone();
        let items = std::mem::take(&mut self.items);
        let container = &self.container;

        step(&app, "register", || Ok(container.register(items)?))?;

        let primary = step(&app, "start", || Ok(container.start()?))
            .and_then(|()| step(&app, "run", || main(container)));
        let stopped = step(&app, "stop", || Ok(container.stop()?));

        match (primary, stopped) {
            (Err(err), Err(stop_err)) => {
                tracing::error!(app = %app, error = %stop_err, "stop failed after an earlier failure");
                Err(err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.config.name)
            .field("container", &self.container)
            .field("queued", &self.items.len())
            .finish()
    }
}

fn step<F>(app: &str, name: &'static str, body: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    tracing::info!(app, step = name, "step started");
    let started_at = Instant::now();
    match body() {
        Ok(()) => {
            tracing::info!(
                app,
                step = name,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "step finished"
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(
                app,
                step = name,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error = %err,
                "step failed"
            );
            Err(err)
        }
    }
}
