use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unit of the nonce an exchange expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceResolution {
    #[default]
    Milliseconds,
    Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoncePolicy {
    #[serde(default)]
    pub resolution: NonceResolution,
    /// Bump past the previous value instead of repeating it within one tick
    #[serde(default = "default_strict")]
    pub strictly_increasing: bool,
}

const fn default_strict() -> bool {
    true
}

impl Default for NoncePolicy {
    fn default() -> Self {
        Self {
            resolution: NonceResolution::Milliseconds,
            strictly_increasing: true,
        }
    }
}

impl NoncePolicy {
    pub fn milliseconds() -> Self {
        Self::default()
    }

    pub fn seconds() -> Self {
        Self {
            resolution: NonceResolution::Seconds,
            strictly_increasing: true,
        }
    }

    pub fn allow_repeats(mut self) -> Self {
        self.strictly_increasing = false;
        self
    }

    /// Convert a nonce issued under this policy to whole seconds
    pub fn to_seconds(&self, nonce: u64) -> u64 {
        match self.resolution {
            NonceResolution::Milliseconds => nonce / 1000,
            NonceResolution::Seconds => nonce,
        }
    }
}

/// Time source for nonces, swappable in tests
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Per-credential nonce source.
///
/// Values never decrease. With a strictly increasing policy two calls in the same
/// tick (or from different threads) get distinct values.
pub struct NonceProvider {
    policy: NoncePolicy,
    clock: Arc<dyn Clock>,
    last: AtomicU64,
}

impl std::fmt::Debug for NonceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceProvider")
            .field("policy", &self.policy)
            .field("last", &self.last.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl NonceProvider {
    pub fn new(policy: NoncePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: NoncePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            last: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> NoncePolicy {
        self.policy
    }

    fn now(&self) -> u64 {
        let millis = self.clock.now_millis();
        match self.policy.resolution {
            NonceResolution::Milliseconds => millis,
            NonceResolution::Seconds => millis / 1000,
        }
    }

    pub fn next_nonce(&self) -> u64 {
        let now = self.now();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let next = if self.policy.strictly_increasing {
                now.max(last + 1)
            } else {
                now.max(last)
            };
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}
