use embassy_time::{Duration, Instant};

/// Monotonic time source and blocking sleep used by every wait loop of the
/// driver.
pub trait Clock {
    fn now(&self) -> Instant;

    fn sleep(&mut self, duration: Duration);
}

/// [`Clock`] backed by the embassy-time driver of the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[cfg(feature = "std")]
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(core::time::Duration::from_micros(duration.as_micros()));
    }

    #[cfg(not(feature = "std"))]
    fn sleep(&mut self, duration: Duration) {
        let expires_at = Instant::now() + duration;
        while Instant::now() < expires_at {}
    }
}

/// A bounded number of fixed-interval waits.
///
/// Worst case latency of a loop driven by a `Ticker` is `polls * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    interval: Duration,
    remaining: u32,
}

impl Ticker {
    pub fn new(polls: u32, interval: Duration) -> Self {
        Self {
            interval,
            remaining: polls,
        }
    }

    /// Sleep one interval. Returns `false` without sleeping once the budget
    /// is spent or the ticker was cancelled.
    pub fn wait(&mut self, clock: &mut impl Clock) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        clock.sleep(self.interval);
        true
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}
