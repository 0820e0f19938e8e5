//! Time source for token issuance and expiry checks.

/// Current time in whole unix seconds.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> i64;
}

/// Wall clock backed by [`chrono::Utc`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
