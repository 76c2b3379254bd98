use std::time::Duration;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Linear backoff: the n-th retry waits `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Reconnect after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Out of attempts. Reported once per channel.
    Exhausted { attempts: u32 },
    /// Nothing more to do: a normal closure, a deliberate stop, or the
    /// exhaustion was already reported.
    Stopped,
}

/// Attempt counter for one channel. Each channel owns its own.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
    stopped: bool,
    exhausted: bool,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            stopped: false,
            exhausted: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// `normal` is true for a close with code 1000. Failed connects are abnormal.
    pub fn on_close(&mut self, normal: bool) -> CloseOutcome {
        if self.stopped || self.exhausted || normal {
            return CloseOutcome::Stopped;
        }

        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            return CloseOutcome::Retry {
                attempt: self.attempts,
                delay: self.policy.delay_for(self.attempts),
            };
        }

        self.exhausted = true;
        CloseOutcome::Exhausted {
            attempts: self.attempts,
        }
    }

    /// Deliberate disconnect: pin the counter at the maximum so no retry or
    /// terminal error follows.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.attempts = self.policy.max_attempts;
    }
}
