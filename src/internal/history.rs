//! Service history: every started service in start order, unwound in reverse.

use parking_lot::Mutex;

use crate::error::{DiError, DiResult, StopFailure};
use crate::lifecycle::{Hooks, UpArgs};

/// Tracker switch. `Stopping` is the on→off transition in which unwinding is
/// allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrackerState {
    Off,
    On,
    Stopping,
}

struct Record {
    label: String,
    hooks: Hooks,
}

// Records before `floor` belong to finished runs. `cursor` is one past the
// current record.
struct HistoryInner {
    records: Vec<Record>,
    floor: usize,
    cursor: usize,
    state: TrackerState,
}

impl HistoryInner {
    fn rewind_to_latest(&mut self) {
        self.cursor = self.records.len();
    }

    fn rewind_to_earliest(&mut self) {
        self.cursor = self.floor;
    }
}

/// Arena-backed history of started services.
pub(crate) struct ServiceHistory {
    inner: Mutex<HistoryInner>,
}

impl ServiceHistory {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                records: Vec::new(),
                floor: 0,
                cursor: 0,
                state: TrackerState::Off,
            }),
        }
    }

    pub(crate) fn state(&self) -> TrackerState {
        self.inner.lock().state
    }

    /// Turns the tracker on. A tracker left on by a failed start refuses
    /// until it has been unwound.
    pub(crate) fn turn_on(&self) -> DiResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            TrackerState::Off => {
                inner.state = TrackerState::On;
                Ok(())
            }
            TrackerState::On => Err(DiError::TrackerState("stop required after failed start")),
            TrackerState::Stopping => Err(DiError::TrackerState("cannot turn on while stopping")),
        }
    }

    /// Moves the tracker into `Stopping`. Returns false when it was off.
    pub(crate) fn begin_stop(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            TrackerState::On => {
                inner.state = TrackerState::Stopping;
                true
            }
            _ => false,
        }
    }

    /// Appends the service and calls its `up` hook outside the lock. The
    /// record stays linked when `up` fails.
    pub(crate) fn record_and_start(
        &self,
        label: impl Into<String>,
        hooks: Hooks,
        args: &UpArgs<'_>,
    ) -> DiResult<()> {
        let label = label.into();
        {
            let mut inner = self.inner.lock();
            if inner.state != TrackerState::On {
                return Err(DiError::TrackerState("record requires a running tracker"));
            }
            inner.records.push(Record {
                label: label.clone(),
                hooks: hooks.clone(),
            });
            inner.rewind_to_latest();
        }

        tracing::debug!(service = %label, shape = hooks.shape(), "starting service");
        hooks
            .up(args)
            .map_err(|source| DiError::ServiceStart { address: label, source })
    }

    /// Calls every `down` hook from the latest record back to the earliest.
    /// Failures are collected; every service gets its stop attempt.
    pub(crate) fn unwind_all(&self) -> DiResult<()> {
        let pending: Vec<(String, Hooks)> = {
            let mut inner = self.inner.lock();
            if inner.state != TrackerState::Stopping {
                return Err(DiError::TrackerState("unwind requires a stopping tracker"));
            }
            inner.rewind_to_latest();
            let mut pending = Vec::with_capacity(inner.cursor - inner.floor);
            while inner.cursor > inner.floor {
                inner.cursor -= 1;
                let record = &inner.records[inner.cursor];
                pending.push((record.label.clone(), record.hooks.clone()));
            }
            inner.floor = inner.records.len();
            inner.rewind_to_latest();
            inner.state = TrackerState::Off;
            pending
        };

        let mut failures = Vec::new();
        for (label, hooks) in pending {
            tracing::debug!(service = %label, "stopping service");
            if let Err(error) = hooks.down() {
                tracing::warn!(service = %label, error = %error, "service failed to stop");
                failures.push(StopFailure {
                    service: label,
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Stop(failures))
        }
    }

    /// Parks the cursor at the most recent record.
    pub(crate) fn rewind_to_latest(&self) {
        self.inner.lock().rewind_to_latest();
    }

    /// Labels of the live records, earliest first.
    pub(crate) fn labels(&self) -> Vec<String> {
        let mut inner = self.inner.lock();
        inner.rewind_to_earliest();
        let mut labels = Vec::with_capacity(inner.records.len() - inner.floor);
        while inner.cursor < inner.records.len() {
            labels.push(inner.records[inner.cursor].label.clone());
            inner.cursor += 1;
        }
        labels
    }

    /// Number of live records.
    pub(crate) fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.records.len() - inner.floor
    }
}
