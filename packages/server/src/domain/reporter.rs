//! Error reporting sink.
//!
//! Steady-state failures (store, bus, delivery, reconciliation) do not abort the
//! instance. They are handed to one `ErrorReporter` instead of being logged ad hoc.

use std::{error::Error, fmt};

/// Category of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Shared counter increment/decrement/get/set failed
    Counter,
    /// Publishing to the broadcast bus failed
    Publish,
    /// A bus subscription could not be established or was lost
    Subscription,
    /// A bus payload could not be turned into a client event
    Delivery,
    /// Shutdown reconciliation did not complete
    Reconcile,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Publish => "publish",
            Self::Subscription => "subscription",
            Self::Delivery => "delivery",
            Self::Reconcile => "reconcile",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, kind: FailureKind, operation: &str, error: &dyn Error);
}
