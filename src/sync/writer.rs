//! Debounced full-document writes to the remote store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::error::RemoteError;
use super::remote::RemoteStore;
use super::scheduler::DebounceScheduler;
use crate::identity::ClientContext;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub scheduled: u64,
    pub written: u64,
    pub failed: u64,
    pub last_error: Option<RemoteError>,
}

/// Coalesces a burst of local changes into one remote `replace`.
///
/// A failed write is logged and counted. It is not retried and local state
/// is not rolled back; the next local change schedules a fresh write.
pub struct DebouncedWriter {
    scheduler: DebounceScheduler<Value>,
    remote: Arc<dyn RemoteStore>,
    origin: ClientContext,
    stats: WriterStats,
}

impl DebouncedWriter {
    pub fn new(remote: Arc<dyn RemoteStore>, origin: ClientContext, delay: Duration) -> Self {
        Self {
            scheduler: DebounceScheduler::with_delay(delay),
            remote,
            origin,
            stats: WriterStats::default(),
        }
    }

    pub fn schedule(&mut self, doc: Value) {
        self.schedule_at(doc, Instant::now());
    }

    pub fn schedule_at(&mut self, doc: Value, now: Instant) {
        self.stats.scheduled += 1;
        self.scheduler.schedule_at(doc, now);
        tracing::debug!(
            delay_ms = self.scheduler.delay().as_millis() as u64,
            "remote write scheduled"
        );
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Writes the pending document if its quiet period has elapsed. `None`
    /// when nothing was due.
    pub fn fire_due(&mut self, now: Instant) -> Option<Result<(), RemoteError>> {
        let doc = self.scheduler.take_due(now)?;
        Some(self.write(doc))
    }

    /// Writes the pending document immediately.
    pub fn flush(&mut self) -> Option<Result<(), RemoteError>> {
        let doc = self.scheduler.take_now()?;
        Some(self.write(doc))
    }

    /// Drops the pending document without writing it.
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
    }

    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    fn write(&mut self, doc: Value) -> Result<(), RemoteError> {
        match self.remote.replace(&self.origin, doc) {
            Ok(()) => {
                self.stats.written += 1;
                tracing::debug!(session = %self.origin.session, "remote document replaced");
                Ok(())
            }
            Err(err) => {
                self.stats.failed += 1;
                self.stats.last_error = Some(err.clone());
                tracing::warn!(
                    session = %self.origin.session,
                    transience = ?err.transience(),
                    "remote write failed: {err}"
                );
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for DebouncedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedWriter")
            .field("pending", &self.scheduler.is_pending())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::sync::MemoryRemote;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn writer(remote: &MemoryRemote) -> DebouncedWriter {
        DebouncedWriter::new(
            Arc::new(remote.clone()),
            ClientContext::named("writer"),
            ms(500),
        )
    }

    #[test]
    fn burst_produces_one_write_with_latest_doc() {
        let remote = MemoryRemote::new();
        let mut writer = writer(&remote);
        let t = Instant::now();
        writer.schedule_at(json!({"n": 1}), t);
        writer.schedule_at(json!({"n": 2}), t + ms(100));
        writer.schedule_at(json!({"n": 3}), t + ms(200));

        assert!(writer.fire_due(t + ms(600)).is_none());
        assert_eq!(remote.write_count(), 0);
        assert_eq!(writer.fire_due(t + ms(700)), Some(Ok(())));
        assert_eq!(remote.write_count(), 1);
        assert_eq!(remote.document(), Some(json!({"n": 3})));
        assert!(writer.fire_due(t + ms(5_000)).is_none());
        assert_eq!(writer.stats().scheduled, 3);
        assert_eq!(writer.stats().written, 1);
    }

    #[test]
    fn failed_write_is_counted_not_retried() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        let mut writer = writer(&remote);
        let t = Instant::now();
        writer.schedule_at(json!({"n": 1}), t);
        assert!(matches!(
            writer.fire_due(t + ms(500)),
            Some(Err(RemoteError::Unavailable { .. }))
        ));
        assert_eq!(writer.stats().failed, 1);
        assert!(!writer.is_pending());

        remote.set_offline(false);
        assert!(writer.fire_due(t + ms(10_000)).is_none());
        assert_eq!(remote.write_count(), 0);
    }

    #[test]
    fn flush_ignores_quiet_period() {
        let remote = MemoryRemote::new();
        let mut writer = writer(&remote);
        writer.schedule(json!({"n": 1}));
        assert_eq!(writer.flush(), Some(Ok(())));
        assert_eq!(remote.write_count(), 1);
        assert!(writer.flush().is_none());
    }
}
