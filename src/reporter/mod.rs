//! Reporter lifecycle state machine.

pub use observer::ReporterObserver;
pub use settings::ReporterSettings;

use std::fmt;
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::batch::BatchSerializer;
use crate::client::StorageClient;
use crate::error::ReportError;
use crate::metric::MetricCollection;
use crate::registry::CollectionRegistry;
use crate::scheduler::{Scheduler, TimeUnit};

mod observer;
mod settings;

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Lifecycle state of a [`Reporter`].
///
/// `Stopped` is terminal: a stopped reporter cannot be restarted, a new one
/// has to be constructed instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Probing,
    Running,
    Stopped,
}

impl ReporterState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Ships point-in-time snapshots of registered metric collections to a
/// remote storage backend on a fixed cadence.
///
/// Once started, the reporter probes the backend until it answers, then
/// flushes all registered collections immediately and on every further
/// interval. Lifecycle outcomes surface through subscribed
/// [`ReporterObserver`]s; no operation blocks the caller.
///
/// [`stop`](Reporter::stop) must be called to dispose the timers, otherwise
/// the scheduled probe or flush loop keeps the reporter alive indefinitely.
/// Requires a tokio runtime with time enabled.
pub struct Reporter<C> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    client: C,
    serializer: BatchSerializer,
    probe_interval: Duration,
    state: Mutex<ReporterState>,
    registry: Mutex<CollectionRegistry>,
    scheduler: Mutex<Scheduler>,
    observers: Mutex<Vec<Arc<dyn ReporterObserver>>>,
}

/// Lock poisoning only happens when an observer panicked; reporter state
/// stays coherent, so the guard is recovered instead of propagated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C> Reporter<C> {
    /// Current lifecycle state.
    pub fn state(&self) -> ReporterState {
        *lock(&self.inner.state)
    }

    /// Subscribes an observer to lifecycle events.
    ///
    /// Observers are notified in subscription order and can be added in any
    /// state.
    pub fn subscribe(&self, observer: Arc<dyn ReporterObserver>) {
        lock(&self.inner.observers).push(observer);
    }

    /// Registers a collection; its metrics appear starting with the next
    /// flush cycle, never the one currently in flight.
    pub fn add_collection(
        &self,
        collection: Arc<dyn MetricCollection>,
        prefix: Option<&str>,
    ) -> Result<(), ReportError> {
        lock(&self.inner.registry).add(collection, prefix.map(String::from))
    }

    /// Unregisters a collection; it no longer appears in future snapshots
    /// but is still finalized when the reporter stops.
    pub fn remove_collection(&self, collection: &Arc<dyn MetricCollection>) {
        lock(&self.inner.registry).remove(collection);
    }

    /// Stops the reporter from any state.
    ///
    /// Cancels both schedules, finalizes every collection ever registered
    /// and emits the `stop` event. Idempotent: repeated calls have no
    /// further observable effect. A probe or write still in flight runs to
    /// completion, but its result is discarded.
    pub fn stop(&self) {
        {
            let mut state = lock(&self.inner.state);

            if *state == ReporterState::Stopped {
                return;
            }

            *state = ReporterState::Stopped;
        }

        lock(&self.inner.scheduler).cancel_all();

        // finalizers are external code, run them outside of the lock
        let collections = lock(&self.inner.registry).drain_for_finalize();
        for collection in collections {
            collection.finalize();
        }

        debug!("reporter stopped");
        self.inner.emit(|observer| observer.on_stop());
    }
}

impl<C> Reporter<C>
where
    C: StorageClient + Send + Sync + 'static,
{
    /// Creates an idle reporter with default [`ReporterSettings`].
    pub fn new(client: C) -> Self {
        Self::with_settings(client, ReporterSettings::default())
    }

    pub fn with_settings(client: C, settings: ReporterSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                serializer: BatchSerializer::new(
                    settings.target_prefix(),
                    settings.partition(),
                ),
                probe_interval: settings.probe_interval(),
                state: Mutex::new(ReporterState::Idle),
                registry: Mutex::new(CollectionRegistry::default()),
                scheduler: Mutex::new(Scheduler::default()),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Starts shipping with the default 60 second flush interval.
    pub fn start(&self) -> Result<(), ReportError> {
        self.start_at(DEFAULT_FLUSH_INTERVAL)
    }

    /// Starts shipping with a caller-chosen flush interval.
    pub fn start_with(&self, interval: NonZeroU64, unit: TimeUnit) -> Result<(), ReportError> {
        self.start_at(unit.duration(interval))
    }

    /// Valid only from `Idle`: transitions to `Probing` and schedules the
    /// retrying connectivity probe. The first flush happens once the probe
    /// succeeds; until then only `error` events are observable.
    fn start_at(&self, flush_interval: Duration) -> Result<(), ReportError> {
        {
            let mut state = lock(&self.inner.state);

            if *state != ReporterState::Idle {
                return Err(ReportError::InvalidState {
                    state: state.name(),
                });
            }

            *state = ReporterState::Probing;
        }

        debug!(interval = ?flush_interval, "reporter started, probing storage backend");

        let inner = Arc::clone(&self.inner);
        lock(&self.inner.scheduler).schedule_retrying(
            move || {
                let inner = Arc::clone(&inner);
                async move { inner.probe_once(flush_interval).await }
            },
            self.inner.probe_interval,
        );

        Ok(())
    }
}

impl<C> Inner<C>
where
    C: StorageClient + Send + Sync + 'static,
{
    /// One probe attempt. Resolving to `true` ends the retrying schedule,
    /// either because shipping began or because the reporter stopped while
    /// the probe was in flight.
    async fn probe_once(self: Arc<Self>, flush_interval: Duration) -> bool {
        match self.client.probe().await {
            Ok(()) => {
                {
                    let mut state = lock(&self.state);

                    if *state != ReporterState::Probing {
                        return true;
                    }

                    *state = ReporterState::Running;
                }

                debug!("storage backend reachable, shipping begins");
                self.emit(|observer| observer.on_start());

                // The recurring schedule performs the initial flush as its
                // immediate first invocation. Scheduling happens under the
                // state lock so a concurrent stop either prevents it or
                // cancels it, never leaves it running.
                let state = lock(&self.state);
                if *state == ReporterState::Running {
                    let inner = Arc::clone(&self);
                    lock(&self.scheduler).schedule_recurring(
                        move || {
                            let inner = Arc::clone(&inner);
                            async move { inner.flush_cycle().await }
                        },
                        flush_interval,
                    );
                }

                true
            }
            Err(source) => {
                if *lock(&self.state) != ReporterState::Probing {
                    return true;
                }

                let error = ReportError::Probe(source);
                warn!(%error, "storage backend probe failed, retrying");
                self.emit(|observer| observer.on_error(&error));

                false
            }
        }
    }

    /// One serialize-then-write pass over the current registry snapshot.
    async fn flush_cycle(self: Arc<Self>) {
        let entries = {
            let state = lock(&self.state);

            if *state != ReporterState::Running {
                return;
            }

            lock(&self.registry).snapshot_entries()
        };

        let batch = match self.serializer.serialize(&entries) {
            Ok(batch) => batch,
            Err(error) => {
                warn!(%error, "flush cycle skipped");
                if *lock(&self.state) == ReporterState::Running {
                    self.emit(|observer| observer.on_error(&error));
                }
                return;
            }
        };

        let (target, records) = batch.into_parts();

        match self.client.write(&target, &records).await {
            Ok(()) => {
                if *lock(&self.state) != ReporterState::Running {
                    return;
                }

                debug!(%target, records = records.len(), "batch delivered");
                self.emit(|observer| observer.on_update());
            }
            Err(source) => {
                if *lock(&self.state) != ReporterState::Running {
                    return;
                }

                let error = ReportError::Write { target, source };
                warn!(%error, "batch delivery failed");
                self.emit(|observer| observer.on_error(&error));
            }
        }
    }
}

impl<C> Inner<C> {
    /// Notifies all observers in subscription order, outside of every lock.
    fn emit(&self, notify: impl Fn(&dyn ReporterObserver)) {
        let observers = lock(&self.observers).clone();

        for observer in &observers {
            notify(observer.as_ref());
        }
    }
}

impl<C> fmt::Debug for Reporter<C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Reporter")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
