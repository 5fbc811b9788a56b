use crate::error::ReportError;

/// Observer of reporter lifecycle events.
///
/// Every method has a no-op default, so an implementor only overrides the
/// events it cares about and an unobserved failure never escalates beyond
/// the `error` event that carried it.
///
/// Observers are invoked in subscription order, outside of any reporter
/// lock, and at most once per occurrence.
pub trait ReporterObserver: Send + Sync {
    /// Connectivity probe succeeded; periodic shipping is about to begin.
    ///
    /// Fires strictly before the first write call.
    fn on_start(&self) {}

    /// One batch was delivered. Fires only after the write completed.
    fn on_update(&self) {}

    /// A probe, write or serialization failure was observed.
    fn on_error(&self, _error: &ReportError) {}

    /// The reporter was stopped and every collection finalized.
    fn on_stop(&self) {}
}
