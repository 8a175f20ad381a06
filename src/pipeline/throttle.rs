// Batch throttle for the metadata provider.
//
// The provider has no published rate limit, but hammering it with ten
// thousand requests back-to-back is rude. The throttle inserts a fixed pause
// after every `every` launches. It only delays launches; it never drops or
// reorders work, so it cannot change the final tables or ranking.

use tokio::time::Duration;
use tracing::debug;

/// Default pause length.
pub const DEFAULT_THROTTLE_PAUSE: Duration = Duration::from_millis(1000);

/// Pause for `pause` before every `every`-th launch. `every = 0` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    every: u32,
    pause: Duration,
}

impl Throttle {
    pub fn new(every: u32, pause: Duration) -> Self {
        Self { every, pause }
    }

    /// A throttle that never pauses.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.every > 0 && !self.pause.is_zero()
    }

    /// Whether launch number `seq` (1-based) should be preceded by a pause.
    pub fn should_pause(&self, seq: u32) -> bool {
        self.is_enabled() && seq % self.every == 0
    }

    /// Wait, if needed, before launch number `seq` (1-based).
    pub async fn before_launch(&self, seq: u32) {
        if self.should_pause(seq) {
            debug!(seq, pause_ms = self.pause.as_millis() as u64, "Throttling launches");
            tokio::time::sleep(self.pause).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::disabled()
    }
}
