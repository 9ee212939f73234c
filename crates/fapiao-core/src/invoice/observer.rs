//! Diagnostic hooks for the extraction engine.
//!
//! The engine never writes logs or files itself. Callers inject an
//! [`ExtractionObserver`]; the default one forwards to `tracing`.

use tracing::{debug, trace};

use super::rules::Field;

/// Receives extraction events. All methods default to doing nothing.
pub trait ExtractionObserver: Send + Sync {
    /// A field was resolved by the strategy at `index` in its rule.
    fn field_resolved(&self, _field: Field, _index: usize, _strategy: &str, _value: &str) {}

    /// No strategy produced a value for the field.
    fn field_missing(&self, _field: Field) {}

    /// A cross-field fallback replaced an empty value.
    fn fallback_applied(&self, _field: Field, _value: &str) {}
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExtractionObserver for TracingObserver {
    fn field_resolved(&self, field: Field, index: usize, strategy: &str, value: &str) {
        trace!(%field, index, strategy, value, "field resolved");
    }

    fn field_missing(&self, field: Field) {
        debug!(%field, "no strategy matched");
    }

    fn fallback_applied(&self, field: Field, value: &str) {
        debug!(%field, value, "cross-field fallback applied");
    }
}
