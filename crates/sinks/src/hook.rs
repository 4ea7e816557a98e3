//! Hook trait - the boundary between a logging façade and a sink

use crate::entry::{Entry, Level};

/// A destination that receives log entries from a logging façade
///
/// Implementations must return quickly: `deliver` is called on the thread
/// that emitted the log event. Anything slow (I/O, retries) belongs in work
/// the hook schedules itself.
pub trait Hook: Send + Sync {
    /// Levels this hook accepts; the façade only routes these
    fn levels(&self) -> &[Level];

    /// Accept one entry
    ///
    /// Infallible from the caller's point of view. Failures that happen
    /// after the entry is accepted are the hook's to report.
    fn deliver(&self, entry: &Entry);

    /// Whether entries of `level` should be routed to this hook
    fn accepts(&self, level: Level) -> bool {
        self.levels().contains(&level)
    }
}

impl<H: Hook + ?Sized> Hook for std::sync::Arc<H> {
    fn levels(&self) -> &[Level] {
        (**self).levels()
    }

    fn deliver(&self, entry: &Entry) {
        (**self).deliver(entry);
    }
}
