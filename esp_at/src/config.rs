use embassy_time::Duration;

/// What the first receive phase does once `OK` has been seen.
///
/// Some commands emit informational lines after their `OK`, others go
/// quiet immediately.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OkCutoff {
    /// Keep polling until the whole response budget is spent
    Exhaust,
    /// Stop at the first poll after `OK` that yields no new line
    Quiet,
}

/// Timing of the command engine and the system facade.
///
/// The defaults match the timings the module's AT firmware is known to
/// need: a one second window for fast acknowledgements, a three second
/// grace period for scans and joins, and a six second boot drain after a
/// reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) poll_interval: Duration,
    pub(crate) response_polls: u32,
    pub(crate) escalated_polls: u32,
    pub(crate) ok_cutoff: OkCutoff,
    pub(crate) boot_polls: u32,
    pub(crate) boot_drain_polls: u32,
    pub(crate) boot_drain_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            response_polls: 100,
            escalated_polls: 300,
            ok_cutoff: OkCutoff::Exhaust,
            boot_polls: 300,
            boot_drain_polls: 300,
            boot_drain_interval: Duration::from_millis(20),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn response_polls(mut self, polls: u32) -> Self {
        self.response_polls = polls;
        self
    }

    /// Default number of escalated polls, used when a command yields
    /// output without `OK` and the caller gave no timeout.
    #[must_use]
    pub const fn escalated_polls(mut self, polls: u32) -> Self {
        self.escalated_polls = polls;
        self
    }

    #[must_use]
    pub const fn ok_cutoff(mut self, cutoff: OkCutoff) -> Self {
        self.ok_cutoff = cutoff;
        self
    }

    #[must_use]
    pub const fn boot_polls(mut self, polls: u32) -> Self {
        self.boot_polls = polls;
        self
    }

    #[must_use]
    pub const fn boot_drain(mut self, polls: u32, interval: Duration) -> Self {
        self.boot_drain_polls = polls;
        self.boot_drain_interval = interval;
        self
    }

    /// Number of escalated polls for an optional caller timeout.
    ///
    /// A missing or zero timeout falls back to the configured default. Any
    /// other timeout gets at least one poll.
    pub(crate) fn escalated_polls_for(&self, timeout: Option<Duration>) -> u32 {
        match timeout {
            Some(t) if t.as_ticks() > 0 => {
                let interval = self.poll_interval.as_micros().max(1);
                t.as_micros()
                    .div_ceil(interval)
                    .min(u64::from(u32::MAX)) as u32
            }
            _ => self.escalated_polls,
        }
    }
}
