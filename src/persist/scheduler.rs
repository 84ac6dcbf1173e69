use std::time::{Duration, Instant};

/// Debounce timer for automatic saves.
///
/// Every edit pushes the deadline out to `now + delay`; [`poll`] fires once
/// the deadline has passed and then disarms until the next edit.
///
/// [`poll`]: SaveScheduler::poll
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl SaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending save and start a new quiet period at `now`.
    pub fn note_edit(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns `true` exactly once per quiet period, when it has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
