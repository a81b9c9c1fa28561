//! Alert Debouncer Implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, info};

/// Firing policy for one alertable condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatchPolicy {
    /// Minimum time between two fires of this condition (milliseconds).
    /// Applies on top of the latch, even if the condition clears and re-arms.
    pub cooldown_ms: Option<u64>,
    /// Fire again whenever the cooldown allows, even within one episode
    pub repeat: bool,
}

impl LatchPolicy {
    pub fn latch_only() -> Self {
        Self {
            cooldown_ms: None,
            repeat: false,
        }
    }

    pub fn with_cooldown(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms: Some(cooldown_ms),
            repeat: false,
        }
    }

    /// Reminder that keeps firing every `cooldown_ms` while the condition holds
    pub fn repeating(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms: Some(cooldown_ms),
            repeat: true,
        }
    }
}

/// State of one condition's latch
#[derive(Debug, Clone, Default)]
pub struct LatchState {
    /// Policy this latch was registered with
    pub policy: LatchPolicy,
    /// Already notified for the current episode
    pub spoken: bool,
    /// Timestamp of the last fire (milliseconds)
    pub last_fired_ms: Option<u64>,
    /// Number of times fired
    pub fire_count: usize,
}

impl LatchState {
    fn in_cooldown(&self, now_ms: u64) -> bool {
        match (self.policy.cooldown_ms, self.last_fired_ms) {
            (Some(cooldown), Some(last)) => now_ms.saturating_sub(last) < cooldown,
            _ => false,
        }
    }
}

/// Debouncer for edge-triggered alerts.
///
/// Each condition owns a latch that lets it fire once per continuous episode;
/// conditions registered with a cooldown are additionally rate limited.
/// Unregistered conditions behave as latch-only.
#[derive(Debug, Clone)]
pub struct AlertDebouncer<K> {
    /// Latch states by condition
    states: HashMap<K, LatchState>,
}

impl<K> AlertDebouncer<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Create an empty debouncer
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Register (or replace) the policy of a condition
    pub fn register(&mut self, key: K, policy: LatchPolicy) {
        self.states.entry(key).or_default().policy = policy;
    }

    /// Check whether `key` may fire now; if so the latch is set and the fire recorded.
    ///
    /// A suppressed attempt leaves the latch open, so a condition that is still
    /// active when its cooldown expires fires at that point.
    pub fn should_fire(&mut self, key: K, now_ms: u64) -> bool {
        let state = self.states.entry(key).or_default();

        if state.spoken && !state.policy.repeat {
            return false;
        }

        if state.in_cooldown(now_ms) {
            debug!("Alert {:?} suppressed: in cooldown period", key);
            return false;
        }

        state.spoken = true;
        state.last_fired_ms = Some(now_ms);
        state.fire_count += 1;

        info!("Alert fired: {:?} (count: {})", key, state.fire_count);
        true
    }

    /// Re-arm the latch once the condition's trigger is no longer true.
    /// Cooldown timers keep running.
    pub fn clear(&mut self, key: K) {
        if let Some(state) = self.states.get_mut(&key) {
            if state.spoken {
                debug!("Alert {:?} re-armed", key);
            }
            state.spoken = false;
        }
    }

    /// Whether the condition has already fired for the current episode
    pub fn is_latched(&self, key: K) -> bool {
        self.states.get(&key).map(|s| s.spoken).unwrap_or(false)
    }

    /// Whether a fire of `key` at `now_ms` would be blocked by its cooldown
    pub fn in_cooldown(&self, key: K, now_ms: u64) -> bool {
        self.states
            .get(&key)
            .map(|s| s.in_cooldown(now_ms))
            .unwrap_or(false)
    }

    /// Number of times the condition has fired
    pub fn fire_count(&self, key: K) -> usize {
        self.states.get(&key).map(|s| s.fire_count).unwrap_or(0)
    }

    /// Get the latch state of a condition
    pub fn state(&self, key: K) -> Option<&LatchState> {
        self.states.get(&key)
    }

    /// Clear every latch and cancel every cooldown timer; registered policies are kept
    pub fn reset(&mut self) {
        for state in self.states.values_mut() {
            state.spoken = false;
            state.last_fired_ms = None;
            state.fire_count = 0;
        }
    }
}

impl<K> Default for AlertDebouncer<K>
where
    K: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
