/// Concurrent access integration tests
///
/// These tests verify that the container behaves correctly when shared
/// between threads: lookups and invocations run in parallel, only one of
/// several racing `start` calls wins, and `stop` runs every hook exactly once.

use bootkit::{constructor, value, Container, DiError, Injectable, Service};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

// ===== Test Services =====

#[derive(Debug)]
pub struct CounterService {
    count: AtomicU32,
}

impl CounterService {
    pub fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get_count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

bootkit::injectable!(CounterService);

#[derive(Default)]
pub struct Hooks {
    ups: AtomicUsize,
    downs: AtomicUsize,
}
bootkit::injectable!(Hooks);

pub struct Worker {
    hooks: Arc<Hooks>,
}

impl Service for Worker {
    fn up(&self) -> anyhow::Result<()> {
        self.hooks.ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn down(&self) -> anyhow::Result<()> {
        self.hooks.downs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Injectable for Worker {
    fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        Some(self)
    }
}

// ===== Tests =====

#[test]
fn test_concurrent_resolution_shares_one_instance() {
    let container = Container::new();
    container
        .register([constructor(CounterService::new)])
        .unwrap();
    container.start().unwrap();

    let threads = 8;
    let per_thread = 100;
    crossbeam_utils::thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|_| {
                for _ in 0..per_thread {
                    container.resolve::<CounterService>().unwrap().increment();
                }
            });
        }
    })
    .unwrap();

    let counter = container.resolve::<CounterService>().unwrap();
    assert_eq!(counter.get_count(), threads * per_thread);
    container.stop().unwrap();
}

#[test]
fn test_concurrent_invoke() {
    let container = Container::new();
    container
        .register([value(CounterService::new())])
        .unwrap();
    container.start().unwrap();

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                for _ in 0..50 {
                    container
                        .invoke(|counter: Arc<CounterService>| {
                            counter.increment();
                        })
                        .unwrap();
                }
            });
        }
    })
    .unwrap();

    assert_eq!(container.resolve::<CounterService>().unwrap().get_count(), 200);
}

#[test]
fn test_only_one_racing_start_wins() {
    let hooks = Arc::new(Hooks::default());
    let container = Container::new();
    container
        .register([
            value(hooks.clone()),
            constructor(|hooks: Arc<Hooks>| Worker { hooks }),
        ])
        .unwrap();

    let threads = 6;
    let barrier = Barrier::new(threads);
    let wins = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|_| {
                barrier.wait();
                match container.start() {
                    Ok(()) => wins.fetch_add(1, Ordering::SeqCst),
                    Err(DiError::AlreadyStarted) => rejected.fetch_add(1, Ordering::SeqCst),
                    Err(other) => panic!("unexpected: {:?}", other),
                };
            });
        }
    })
    .unwrap();

    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert_eq!(rejected.load(Ordering::SeqCst), threads - 1);
    assert_eq!(hooks.ups.load(Ordering::SeqCst), 1);

    container.stop().unwrap();
    assert_eq!(hooks.downs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_racing_stops_run_each_hook_once() {
    let hooks = Arc::new(Hooks::default());
    let container = Container::new();
    container
        .register([
            value(hooks.clone()),
            constructor(|hooks: Arc<Hooks>| Worker { hooks }),
        ])
        .unwrap();
    container.start().unwrap();

    let barrier = Barrier::new(4);
    crossbeam_utils::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                barrier.wait();
                container.stop().unwrap();
            });
        }
    })
    .unwrap();

    assert_eq!(hooks.downs.load(Ordering::SeqCst), 1);
    assert!(!container.is_running());
}

#[test]
fn test_descriptors_while_resolving() {
    let container = Container::new();
    container
        .register([value(CounterService::new()), value(5u8)])
        .unwrap();
    container.start().unwrap();
    let expected = container.len();

    crossbeam_utils::thread::scope(|s| {
        s.spawn(|_| {
            for _ in 0..100 {
                assert_eq!(container.descriptors().len(), expected);
            }
        });
        s.spawn(|_| {
            for _ in 0..100 {
                assert_eq!(*container.resolve::<u8>().unwrap(), 5);
            }
        });
    })
    .unwrap();
}
