//! Internal machinery not exposed in the public API.

mod history;

pub(crate) use history::{ServiceHistory, TrackerState};
