//! Check progress observation
//!
//! This module provides the `CheckObserver` trait for following a verification
//! run and a `TracingObserver` implementation that logs using the `tracing` crate.
//! The terminal implementation lives in [`crate::output`].

use crate::output::outcome_line;
use crate::verify::{CheckOutcome, CheckTarget};
use tracing::{info, warn};

/// Observer trait for digest check events
pub trait CheckObserver {
    /// Called before the registry is queried for `target`
    fn on_check_start(&mut self, target: &CheckTarget);

    /// Called once `target` has an outcome
    fn on_check_finished(&mut self, target: &CheckTarget, outcome: &CheckOutcome);
}

/// Observer that reports checks through `tracing`, keeping stdout free
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CheckObserver for TracingObserver {
    fn on_check_start(&mut self, target: &CheckTarget) {
        info!("Checking {} ({})", target.image, target.architecture);
    }

    fn on_check_finished(&mut self, target: &CheckTarget, outcome: &CheckOutcome) {
        let line = outcome_line(target, outcome);
        match outcome {
            CheckOutcome::Match => info!("{}", line),
            _ => warn!("{}", line),
        }
    }
}
