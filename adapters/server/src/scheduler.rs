//! Per-room timers: the periodic tick driver and a single pending phase delay.

use std::{future, pin::Pin, time::Duration};

use rampart_core::Command;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

/// Phase transition triggered when a delay elapses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayedAction {
    /// Ends the spawn grace window.
    ResumeCombat,
    /// Ends the shop window by spawning the next wave.
    NextWave,
}

impl DelayedAction {
    /// World command carried out when the delay fires.
    #[must_use]
    pub const fn command(self) -> Command {
        match self {
            Self::ResumeCombat => Command::ResumeCombat,
            Self::NextWave => Command::BeginWave,
        }
    }
}

/// Timer that completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerFire {
    /// The periodic driver ticked at the given instant.
    Tick(Instant),
    /// The pending delay elapsed.
    Delay(DelayedAction),
}

#[derive(Debug)]
struct PendingDelay {
    sleep: Pin<Box<Sleep>>,
    action: DelayedAction,
}

/// Timers owned by one room actor.
///
/// The actor polls [`RoomScheduler::fired`] itself, so a timer removed through
/// [`RoomScheduler::schedule`] or [`RoomScheduler::stop`] can never fire later.
#[derive(Debug, Default)]
pub struct RoomScheduler {
    ticks: Option<Interval>,
    delay: Option<PendingDelay>,
}

impl RoomScheduler {
    /// Creates a scheduler with no timers armed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the periodic driver; the first tick fires one period from now.
    ///
    /// Late ticks are skipped rather than replayed in a burst.
    pub fn start_ticks(&mut self, period: Duration) {
        let mut ticks = time::interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticks = Some(ticks);
    }

    /// Arms the phase delay, replacing any delay still pending.
    pub fn schedule(&mut self, after: Duration, action: DelayedAction) {
        self.delay = Some(PendingDelay {
            sleep: Box::pin(time::sleep(after)),
            action,
        });
    }

    /// Disarms every timer. Calling it on a stopped scheduler does nothing.
    pub fn stop(&mut self) {
        self.ticks = None;
        self.delay = None;
    }

    /// Reports whether the periodic driver is running.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticks.is_some()
    }

    /// Action of the pending delay, if any.
    #[must_use]
    pub fn pending(&self) -> Option<DelayedAction> {
        self.delay.as_ref().map(|delay| delay.action)
    }

    /// Waits for the next timer to complete; never returns while nothing is armed.
    ///
    /// Cancel safe: dropping the future loses no tick and keeps the delay armed.
    pub async fn fired(&mut self) -> SchedulerFire {
        let Self { ticks, delay } = self;
        tokio::select! {
            biased;
            action = next_delay(delay) => SchedulerFire::Delay(action),
            instant = next_tick(ticks) => SchedulerFire::Tick(instant),
        }
    }
}

async fn next_tick(ticks: &mut Option<Interval>) -> Instant {
    match ticks {
        Some(ticks) => ticks.tick().await,
        None => future::pending().await,
    }
}

async fn next_delay(delay: &mut Option<PendingDelay>) -> DelayedAction {
    let Some(pending) = delay.as_mut() else {
        return future::pending().await;
    };
    pending.sleep.as_mut().await;
    let action = pending.action;
    *delay = None;
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const PERIOD: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn ticks_fire_once_per_period() {
        let mut scheduler = RoomScheduler::new();
        let started = Instant::now();
        scheduler.start_ticks(PERIOD);

        for expected in 1..=3_u32 {
            match scheduler.fired().await {
                SchedulerFire::Tick(at) => assert_eq!(at - started, PERIOD * expected),
                other => panic!("unexpected fire {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_pending_delay() {
        let mut scheduler = RoomScheduler::new();
        scheduler.schedule(Duration::from_secs(2), DelayedAction::ResumeCombat);
        scheduler.schedule(Duration::from_secs(5), DelayedAction::NextWave);
        assert_eq!(scheduler.pending(), Some(DelayedAction::NextWave));

        let started = Instant::now();
        assert_eq!(
            scheduler.fired().await,
            SchedulerFire::Delay(DelayedAction::NextWave)
        );
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert_eq!(scheduler.pending(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_twice_is_harmless_and_silences_every_timer() {
        let mut scheduler = RoomScheduler::new();
        scheduler.start_ticks(PERIOD);
        scheduler.schedule(Duration::from_secs(2), DelayedAction::ResumeCombat);

        scheduler.stop();
        scheduler.stop();

        assert!(!scheduler.is_ticking());
        assert_eq!(scheduler.pending(), None);
        assert!(timeout(Duration::from_secs(60), scheduler.fired())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_fires_between_ticks_without_losing_either() {
        let mut scheduler = RoomScheduler::new();
        scheduler.start_ticks(PERIOD);
        scheduler.schedule(Duration::from_millis(250), DelayedAction::ResumeCombat);

        let mut fired = Vec::new();
        for _ in 0..4 {
            fired.push(match scheduler.fired().await {
                SchedulerFire::Tick(_) => None,
                SchedulerFire::Delay(action) => Some(action),
            });
        }
        assert_eq!(
            fired,
            vec![None, None, Some(DelayedAction::ResumeCombat), None]
        );
        assert!(scheduler.is_ticking());
    }
}
