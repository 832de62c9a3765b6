//! Scheduler tick
//!
//! Runs the event table at the configured period and supplies the tick
//! count it measures intervals with.

use cadence_core::TickSource;
use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use crate::config::TIMING;
use crate::events::AppScheduler;

/// Scheduler ticks derived from the embassy time driver
///
/// Truncated to `u32`, so the count wraps; the scheduler only ever looks at
/// differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl TickSource for EmbassyClock {
    fn now(&self) -> u32 {
        let ticks = Instant::now().as_ticks() as u128 * TIMING.tick_hz as u128
            / embassy_time::TICK_HZ as u128;
        ticks as u32
    }
}

/// Scheduler task - scans the event table once per period
#[embassy_executor::task]
pub async fn scheduler_task(mut scheduler: AppScheduler) {
    info!(
        "Scheduler task started: {} events, period {} us",
        scheduler.len(),
        TIMING.period_us()
    );

    let mut ticker = Ticker::every(Duration::from_micros(TIMING.period_us()));

    loop {
        ticker.next().await;

        let dispatched = scheduler.run();
        if dispatched > 0 {
            trace!("{} events dispatched", dispatched);
        }
    }
}
