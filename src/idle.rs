use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// No activity for at least the configured delay.
    Idle,
    /// First activity after an idle period.
    Resume,
}

/// Single-shot inactivity timer as a deterministic state machine.
///
/// `reset_activity` is called by any consumer on detected activity and
/// cancels/rearms the deadline; `poll` is driven by the owning loop's tick.
/// Exactly one `Idle` fires per quiet period and exactly one `Resume` fires
/// on the next activity after it. Never arms while disabled.
#[derive(Debug)]
pub struct IdleTracker {
    enabled: bool,
    delay: Duration,
    deadline: Option<Instant>,
    idle: bool,
}

impl IdleTracker {
    pub fn new(enabled: bool, delay: Duration) -> Self {
        Self {
            enabled,
            delay,
            deadline: None,
            idle: false,
        }
    }

    /// Update configuration. Disabling drops any pending deadline; a later
    /// `reset_activity` still emits `Resume` if the tracker was idle.
    pub fn configure(&mut self, enabled: bool, delay: Duration) {
        self.enabled = enabled;
        self.delay = delay;
        if !enabled {
            self.deadline = None;
        }
        // An already-armed deadline keeps its old delay until the next reset.
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Record activity at `now`.
    pub fn reset_activity(&mut self, now: Instant) -> Option<IdleEvent> {
        self.deadline = None;

        let resumed = if self.idle {
            self.idle = false;
            Some(IdleEvent::Resume)
        } else {
            None
        };

        if self.enabled {
            self.deadline = Some(now + self.delay);
        }
        resumed
    }

    /// Check the deadline at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<IdleEvent> {
        match self.deadline {
            Some(deadline) if now >= deadline && !self.idle => {
                self.idle = true;
                self.deadline = None;
                Some(IdleEvent::Idle)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn frequent_activity_never_goes_idle() {
        let start = Instant::now();
        let mut tracker = IdleTracker::new(true, ms(100));
        for i in 0..20 {
            assert_eq!(tracker.reset_activity(start + ms(i * 50)), None);
            assert_eq!(tracker.poll(start + ms(i * 50 + 49)), None);
        }
        assert!(!tracker.is_idle());
    }

    #[test]
    fn quiet_period_emits_exactly_one_idle_then_one_resume() {
        let start = Instant::now();
        let mut tracker = IdleTracker::new(true, ms(100));
        tracker.reset_activity(start);

        assert_eq!(tracker.poll(start + ms(99)), None);
        assert_eq!(tracker.poll(start + ms(100)), Some(IdleEvent::Idle));
        // Further polls stay quiet until activity returns.
        assert_eq!(tracker.poll(start + ms(500)), None);
        assert_eq!(tracker.poll(start + ms(900)), None);

        assert_eq!(
            tracker.reset_activity(start + ms(1000)),
            Some(IdleEvent::Resume)
        );
        assert_eq!(tracker.reset_activity(start + ms(1010)), None);
        // Timer rearmed after the resume.
        assert_eq!(tracker.poll(start + ms(1110)), Some(IdleEvent::Idle));
    }

    #[test]
    fn disabled_tracker_never_arms() {
        let start = Instant::now();
        let mut tracker = IdleTracker::new(false, ms(50));
        tracker.reset_activity(start);
        assert_eq!(tracker.poll(start + ms(1000)), None);
        assert!(!tracker.is_idle());
    }

    #[test]
    fn disabling_while_idle_still_resumes_on_activity() {
        let start = Instant::now();
        let mut tracker = IdleTracker::new(true, ms(50));
        tracker.reset_activity(start);
        assert_eq!(tracker.poll(start + ms(50)), Some(IdleEvent::Idle));

        tracker.configure(false, ms(50));
        assert_eq!(
            tracker.reset_activity(start + ms(100)),
            Some(IdleEvent::Resume)
        );
        // But it does not rearm while disabled.
        assert_eq!(tracker.poll(start + ms(1000)), None);
    }
}
