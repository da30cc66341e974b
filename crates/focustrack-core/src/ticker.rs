//! One-second clock feeding the driver's event queue.
//!
//! Every tick carries the generation it was started under. Stopping the
//! ticker aborts its task and bumps the generation, so a tick that was
//! already queued before the stop is recognisably stale and gets dropped by
//! the driver.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

use crate::driver::Input;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            handle: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether a tick stamped with `generation` may still be observed.
    pub fn accepts(&self, generation: u64) -> bool {
        self.is_active() && generation == self.generation
    }

    /// Start ticking into `queue`. The first tick arrives one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, queue: UnboundedSender<Input>) {
        self.stop();
        let generation = self.generation;
        let period = self.period;
        trace!(generation, "ticker started");
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if queue.send(Input::Tick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop ticking. Ticks already queued become stale.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!(generation = self.generation, "ticker stopped");
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::default();
        ticker.start(tx);
        let generation = ticker.generation();

        for _ in 0..3 {
            match rx.recv().await {
                Some(Input::Tick { generation: g }) => assert_eq!(g, generation),
                other => panic!("expected tick, got {other:?}"),
            }
        }
        assert!(ticker.accepts(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::default();
        ticker.start(tx);
        time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_makes_queued_ticks_stale() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::default();
        ticker.start(tx);
        let first = ticker.generation();

        time::sleep(Duration::from_millis(1500)).await;
        ticker.stop();
        assert!(!ticker.accepts(first));

        // The tick sent before stopping is still in the queue, but stale.
        match rx.try_recv() {
            Ok(Input::Tick { generation }) => assert!(!ticker.accepts(generation)),
            other => panic!("expected a queued tick, got {other:?}"),
        }

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
