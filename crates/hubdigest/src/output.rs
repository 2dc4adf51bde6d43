//! Terminal output utilities

use crate::observer::CheckObserver;
use crate::verify::{CheckOutcome, CheckTarget, VerificationReport};
use console::style;
use hubdigest_image::DIGEST_PREFIX;

/// Print a check-in-progress message
pub fn checking(msg: &str) {
    println!("{} {}", style("🔎").blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✅").green().bold(), msg);
}

/// Print a failure message
pub fn failure(msg: &str) {
    println!("{} {}", style("❌").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠️").yellow().bold(), msg);
}

/// Line shown once a check finishes
pub fn outcome_line(target: &CheckTarget, outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::Match => format!("{} ({}) OK", target.image, target.architecture),
        CheckOutcome::Mismatch { actual } => format!(
            "{} ({}) mismatch: expected {}{}, got {}",
            target.image, target.architecture, DIGEST_PREFIX, target.expected, actual
        ),
        CheckOutcome::Error { message } => format!(
            "Failed to check {} ({}): {}",
            target.image, target.architecture, message
        ),
    }
}

/// Prints one status line per check event
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl CheckObserver for ConsoleObserver {
    fn on_check_start(&mut self, target: &CheckTarget) {
        checking(&format!(
            "Checking {} ({}) ...",
            target.image, target.architecture
        ));
    }

    fn on_check_finished(&mut self, target: &CheckTarget, outcome: &CheckOutcome) {
        let line = outcome_line(target, outcome);
        match outcome {
            CheckOutcome::Match => success(&line),
            CheckOutcome::Mismatch { .. } => failure(&line),
            CheckOutcome::Error { .. } => warning(&line),
        }
    }
}

/// Print the closing summary, repeating every failure
pub fn summary(report: &VerificationReport) {
    println!();
    if report.is_success() {
        println!("{} All image hashes match Docker Hub!", style("🎉").green());
        return;
    }

    failure("Some images did not match:");
    for record in &report.failures {
        println!("- {}", record);
    }
}
