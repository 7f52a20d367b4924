//! `ErrorReporter` backed by `tracing`.

use std::error::Error;

use crate::domain::{ErrorReporter, FailureKind, InstanceId};

/// Emits one structured log event per reported failure.
///
/// Lost subscriptions and failed reconciliations are logged at `error` since
/// the operator has to act on them; the rest are per-event and logged at `warn`.
pub struct TracingErrorReporter {
    instance: InstanceId,
}

impl TracingErrorReporter {
    pub fn new(instance: InstanceId) -> Self {
        Self { instance }
    }
}

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, kind: FailureKind, operation: &str, error: &dyn Error) {
        match kind {
            FailureKind::Subscription | FailureKind::Reconcile => tracing::error!(
                instance = %self.instance,
                kind = kind.as_str(),
                operation,
                error = %error,
                "Relay failure"
            ),
            FailureKind::Counter | FailureKind::Publish | FailureKind::Delivery => tracing::warn!(
                instance = %self.instance,
                kind = kind.as_str(),
                operation,
                error = %error,
                "Relay failure"
            ),
        }
    }
}
