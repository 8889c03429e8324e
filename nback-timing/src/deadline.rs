use std::time::Duration;

/// A fixed point on a [`Timer`](crate::Timer)'s clock. The driver arms one
/// per display interval and checks it every pump iteration, which is where
/// the cancel key gets polled too. No wall-clock sleeping is involved, so
/// the whole sequencing layer runs against a fake clock in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    target_ns: u64,
}

impl Deadline {
    pub fn after(now_ns: u64, duration: Duration) -> Self {
        Self {
            target_ns: now_ns.saturating_add(duration.as_nanos() as u64),
        }
    }

    /// Fixture durations are fractional seconds.
    pub fn after_secs(now_ns: u64, secs: f64) -> Self {
        Self::after(now_ns, Duration::from_secs_f64(secs.max(0.0)))
    }

    pub fn target_ns(&self) -> u64 {
        self.target_ns
    }

    pub fn expired(&self, now_ns: u64) -> bool {
        now_ns >= self.target_ns
    }

    pub fn remaining(&self, now_ns: u64) -> Duration {
        Duration::from_nanos(self.target_ns.saturating_sub(now_ns))
    }
}
