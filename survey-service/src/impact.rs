//! Impact counter - one tree planted per hundred answers.
//!
//! [`ImpactTally`] derives the displayed figures from a response count.
//! [`CounterSimulation`] drives a demo count on a timer until stopped.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Answers needed per tree.
pub const RESPONSES_PER_TREE: u64 = 100;

/// CO₂ absorbed per tree, in kilograms.
pub const CO2_KG_PER_TREE: u64 = 22;

/// Answers expected per minute, used for the time estimate.
pub const RESPONSES_PER_MINUTE: u64 = 10;

/// Figures shown by the counter for a given response count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactTally {
    pub responses: u64,
    pub trees_planted: u64,
    pub progress_to_next: u64,
    pub remaining_to_next: u64,
    /// A tree was just completed
    pub goal_reached: bool,
    pub co2_offset_kg: u64,
    pub estimated_minutes: u64,
}

impl ImpactTally {
    pub fn from_responses(responses: u64) -> Self {
        let trees_planted = responses / RESPONSES_PER_TREE;
        let progress_to_next = responses % RESPONSES_PER_TREE;
        let remaining_to_next = RESPONSES_PER_TREE - progress_to_next;
        Self {
            responses,
            trees_planted,
            progress_to_next,
            remaining_to_next,
            goal_reached: progress_to_next == 0 && responses > 0,
            co2_offset_kg: trees_planted * CO2_KG_PER_TREE,
            estimated_minutes: remaining_to_next.div_ceil(RESPONSES_PER_MINUTE),
        }
    }
}

/// Settings for [`CounterSimulation`].
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub initial: u64,
    pub interval: Duration,
    /// Each tick adds a random amount in `0..=max_increment`
    pub max_increment: u64,
    /// Counts above this reset to zero
    pub wrap_above: u64,
    /// Fixed RNG seed; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            initial: 0,
            interval: Duration::from_secs(3),
            max_increment: 2,
            wrap_above: 300,
            seed: None,
        }
    }
}

/// Next simulated count.
pub fn next_count(current: u64, increment: u64, wrap_above: u64) -> u64 {
    let next = current.saturating_add(increment);
    if next > wrap_above {
        0
    } else {
        next
    }
}

/// Shortest tick; zero would make the timer panic.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns the simulated counter.
pub struct CounterSimulation;

impl CounterSimulation {
    /// Start ticking on the current Tokio runtime.
    ///
    /// Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn start(config: CounterConfig) -> CounterHandle {
        let interval = config.interval.max(MIN_INTERVAL);
        let (tx, rx) = watch::channel(ImpactTally::from_responses(config.initial));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        info!(
            initial = config.initial,
            interval_ms = interval.as_millis() as u64,
            "Starting impact counter"
        );

        let task = tokio::spawn(async move {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            let mut count = config.initial;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let increment = rng.gen_range(0..=config.max_increment);
                        count = next_count(count, increment, config.wrap_above);
                        debug!(count, increment, "Counter tick");
                        if tx.send(ImpactTally::from_responses(count)).is_err() {
                            break;
                        }
                    }
                }
            }
            info!(count, "Impact counter stopped");
        });

        CounterHandle {
            rx,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Running counter. Dropping it stops the timer.
pub struct CounterHandle {
    rx: watch::Receiver<ImpactTally>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CounterHandle {
    pub fn current(&self) -> ImpactTally {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ImpactTally> {
        self.rx.clone()
    }

    /// Stop the timer and wait for the task to finish.
    pub async fn stop(mut self) -> ImpactTally {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.current()
    }
}

impl Drop for CounterHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
