//! Time-based triggering, decoupled from what is triggered.
//!
//! Interval math runs on tokio's clock, so tests drive both schedules
//! deterministically with [`tokio::time::pause`] and [`tokio::time::advance`]
//! instead of waiting on the wall clock.

use std::future::Future;
use std::num::NonZeroU64;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, sleep};

/// Unit applied to an interval magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Milliseconds,
    #[default]
    Seconds,
}

impl TimeUnit {
    pub fn duration(self, magnitude: NonZeroU64) -> Duration {
        match self {
            Self::Milliseconds => Duration::from_millis(magnitude.get()),
            Self::Seconds => Duration::from_secs(magnitude.get()),
        }
    }
}

/// Two independent cancellable schedules: one retrying, one recurring.
///
/// The scheduler never interprets failures. A retrying action reports its
/// own success or failure as a boolean and is re-invoked until it succeeds;
/// a recurring action is re-invoked forever. Cancellation is cooperative:
/// dropping the slot's channel stops future invocations, while an in-flight
/// action always runs to completion and its result is left to the caller to
/// discard.
#[derive(Debug, Default)]
pub struct Scheduler {
    retrying: Option<watch::Sender<()>>,
    recurring: Option<watch::Sender<()>>,
}

impl Scheduler {
    /// Invokes `action` immediately, then again after every `retry_interval`
    /// for as long as it keeps resolving to `false`.
    ///
    /// Replaces any previously scheduled retrying action.
    pub fn schedule_retrying<A, F>(&mut self, mut action: A, retry_interval: Duration)
    where
        A: FnMut() -> F + Send + 'static,
        F: Future<Output = bool> + Send + 'static,
    {
        let mut cancelled = replace_slot(&mut self.retrying);

        tokio::spawn(async move {
            loop {
                if action().await {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = cancelled.changed() => break,
                    _ = sleep(retry_interval) => {}
                }
            }
        });
    }

    /// Invokes `action` immediately, then again after every elapsed
    /// `period`, until cancelled.
    ///
    /// Invocations never overlap: the next tick is processed only after the
    /// previous invocation finished. Replaces any previously scheduled
    /// recurring action.
    pub fn schedule_recurring<A, F>(&mut self, mut action: A, period: Duration)
    where
        A: FnMut() -> F + Send + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let mut cancelled = replace_slot(&mut self.recurring);

        tokio::spawn(async move {
            let mut timer = interval(period);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.changed() => break,
                    _ = timer.tick() => action().await,
                }
            }
        });
    }

    /// Stops both schedules; no pending or future invocation fires again.
    pub fn cancel_all(&mut self) {
        self.retrying = None;
        self.recurring = None;
    }
}

fn replace_slot(slot: &mut Option<watch::Sender<()>>) -> watch::Receiver<()> {
    let (sender, receiver) = watch::channel(());
    *slot = Some(sender);
    receiver
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::task::yield_now;
    use tokio::time::advance;

    use super::*;

    const RETRY: Duration = Duration::from_secs(5);
    const PERIOD: Duration = Duration::from_secs(60);

    async fn settle() {
        for _ in 0..32 {
            yield_now().await;
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn count(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn failing_until(calls: Arc<AtomicUsize>, succeed_at: usize) -> impl FnMut() -> std::future::Ready<bool> {
        move || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(attempt >= succeed_at)
        }
    }

    fn recording(calls: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[test]
    fn converts_magnitude_by_unit() {
        let ten = NonZeroU64::new(10).unwrap();

        assert_eq!(TimeUnit::Seconds.duration(ten), Duration::from_secs(10));
        assert_eq!(
            TimeUnit::Milliseconds.duration(ten),
            Duration::from_millis(10)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retrying_action_runs_immediately() {
        let calls = counter();
        let mut scheduler = Scheduler::default();

        scheduler.schedule_retrying(failing_until(Arc::clone(&calls), 99), RETRY);
        settle().await;

        assert_eq!(count(&calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retrying_action_repeats_each_interval_until_success() {
        let calls = counter();
        let mut scheduler = Scheduler::default();

        scheduler.schedule_retrying(failing_until(Arc::clone(&calls), 3), RETRY);
        settle().await;

        advance(RETRY).await;
        settle().await;
        assert_eq!(count(&calls), 2);

        advance(RETRY).await;
        settle().await;
        assert_eq!(count(&calls), 3);

        // succeeded on the third attempt, no further invocations
        advance(RETRY * 4).await;
        settle().await;
        assert_eq!(count(&calls), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_pending_retries() {
        let calls = counter();
        let mut scheduler = Scheduler::default();

        scheduler.schedule_retrying(failing_until(Arc::clone(&calls), 99), RETRY);
        settle().await;

        scheduler.cancel_all();
        advance(RETRY * 10).await;
        settle().await;

        assert_eq!(count(&calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recurring_action_runs_immediately_and_then_each_period() {
        let calls = counter();
        let mut scheduler = Scheduler::default();

        scheduler.schedule_recurring(recording(Arc::clone(&calls)), PERIOD);
        settle().await;
        assert_eq!(count(&calls), 1);

        advance(PERIOD).await;
        settle().await;
        assert_eq!(count(&calls), 2);

        advance(PERIOD * 2).await;
        settle().await;
        assert_eq!(count(&calls), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_recurring_invocations() {
        let calls = counter();
        let mut scheduler = Scheduler::default();

        scheduler.schedule_recurring(recording(Arc::clone(&calls)), PERIOD);
        settle().await;

        scheduler.cancel_all();
        advance(PERIOD * 10).await;
        settle().await;

        assert_eq!(count(&calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_previous_recurring_action() {
        let first = counter();
        let second = counter();
        let mut scheduler = Scheduler::default();

        scheduler.schedule_recurring(recording(Arc::clone(&first)), PERIOD);
        settle().await;
        scheduler.schedule_recurring(recording(Arc::clone(&second)), PERIOD);
        settle().await;

        advance(PERIOD).await;
        settle().await;

        assert_eq!(count(&first), 1);
        assert_eq!(count(&second), 2);
    }
}
