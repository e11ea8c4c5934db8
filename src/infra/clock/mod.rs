//! [`Clock`] and [`Delay`] backed by `embassy_time`, counted at the board
//! tick rate.
use embassy_time::{Instant, Timer};

use crate::core::{Tick, TICKS_PER_SECOND};
use crate::protocol::traits::{clock::Clock, delay::Delay};

/// Board ticks elapsed after `millis` milliseconds, truncated to the 16-bit
/// counter.
#[inline]
pub fn ticks_from_millis(millis: u64) -> Tick {
    Tick((millis.wrapping_mul(TICKS_PER_SECOND) / 1000) as u16)
}

/// Tick source reading the embassy time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Tick {
        ticks_from_millis(Instant::now().as_millis())
    }
}

/// Delay on the embassy timer queue. Needs the embassy executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyDelay;

impl Delay for EmbassyDelay {
    async fn delay_ms(&mut self, millis: u32) {
        Timer::after_millis(millis as u64).await
    }
}
