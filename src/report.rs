//! Outcome reporting.
//!
//! The store never prints. Every committed change and every rejection is
//! handed to an injected [`Reporter`]; the default one forwards to the `log`
//! facade so the binary's `env_logger` decides where it goes.

use crate::error::BatchError;
use crate::store::Outcome;
use log::{info, warn};

/// Receives the result of every store operation.
pub trait Reporter {
    /// A change was validated and written to disk.
    fn committed(&self, outcome: &Outcome);

    /// A change was refused or could not be written.
    fn rejected(&self, error: &BatchError);
}

/// Reports through the `log` crate: commits at info, rejections at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn committed(&self, outcome: &Outcome) {
        info!("{}", outcome);
    }

    fn rejected(&self, error: &BatchError) {
        warn!("{}", error);
    }
}
