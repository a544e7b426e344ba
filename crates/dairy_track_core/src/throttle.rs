//! crates/dairy_track_core/src/throttle.rs
//!
//! A cooldown gate in front of the remote notification fetch. Every trigger
//! path (initial load, dropdown open, refresh after a mutation) goes through
//! the same gate so bursts of UI events collapse into a single request.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// The places a notification fetch can be requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTrigger {
    InitialLoad,
    DropdownOpen,
    PostMutation,
}

impl FetchTrigger {
    /// Minimum time since the previous fetch. Zero disables the interval check.
    pub fn min_interval(self) -> Duration {
        match self {
            FetchTrigger::DropdownOpen => Duration::from_millis(10_000),
            FetchTrigger::InitialLoad | FetchTrigger::PostMutation => Duration::ZERO,
        }
    }

    /// How long the cooldown stays active once the fetch has completed.
    pub fn cooldown(self) -> Duration {
        match self {
            FetchTrigger::InitialLoad => Duration::from_millis(5_000),
            FetchTrigger::DropdownOpen | FetchTrigger::PostMutation => Duration::from_millis(3_000),
        }
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    last_fetch_at: Option<Instant>,
    in_cooldown: bool,
    generation: u64,
}

/// Proof that the gate was acquired. Releasing a stale permit is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a permit that is never released keeps the cooldown active"]
pub struct CooldownPermit {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct FetchThrottle {
    state: Mutex<ThrottleState>,
}

impl FetchThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, min_interval: Duration, records_empty: bool) -> Option<CooldownPermit> {
        self.try_acquire_at(Instant::now(), min_interval, records_empty)
    }

    /// Acquires the gate if no cooldown is active and the previous fetch is
    /// older than `min_interval`, or unconditionally while there are no records.
    pub fn try_acquire_at(
        &self,
        now: Instant,
        min_interval: Duration,
        records_empty: bool,
    ) -> Option<CooldownPermit> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());

        let interval_elapsed = min_interval.is_zero()
            || state
                .last_fetch_at
                .map_or(true, |last| now.saturating_duration_since(last) > min_interval);

        if !records_empty && (state.in_cooldown || !interval_elapsed) {
            debug!(
                in_cooldown = state.in_cooldown,
                "fetch skipped - cooldown active or recent fetch"
            );
            return None;
        }

        state.generation += 1;
        state.in_cooldown = true;
        state.last_fetch_at = Some(now);
        Some(CooldownPermit {
            generation: state.generation,
        })
    }

    /// Ends the cooldown started by `permit`, unless a newer acquire has happened since.
    pub fn release(&self, permit: CooldownPermit) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.generation == permit.generation {
            state.in_cooldown = false;
        }
    }

    /// Schedules `release` after `delay` on the tokio runtime.
    pub fn release_after(self: &Arc<Self>, permit: CooldownPermit, delay: Duration) {
        let throttle = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            throttle.release(permit);
        });
    }

    pub fn in_cooldown(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).in_cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(10_000);

    #[test]
    fn first_acquire_succeeds() {
        let throttle = FetchThrottle::new();
        assert!(throttle.try_acquire_at(Instant::now(), WINDOW, false).is_some());
        assert!(throttle.in_cooldown());
    }

    #[test]
    fn second_acquire_within_window_is_refused() {
        let throttle = FetchThrottle::new();
        let start = Instant::now();
        let permit = throttle.try_acquire_at(start, WINDOW, false).unwrap();
        throttle.release(permit);

        let later = start + Duration::from_millis(4_000);
        assert!(throttle.try_acquire_at(later, WINDOW, false).is_none());
        assert!(throttle.try_acquire_at(later, WINDOW, false).is_none());
    }

    #[test]
    fn empty_record_set_forces_the_fetch() {
        let throttle = FetchThrottle::new();
        let start = Instant::now();
        let _held = throttle.try_acquire_at(start, WINDOW, true).unwrap();
        assert!(throttle
            .try_acquire_at(start + Duration::from_millis(1), WINDOW, true)
            .is_some());
    }

    #[test]
    fn active_cooldown_blocks_even_after_the_window() {
        let throttle = FetchThrottle::new();
        let start = Instant::now();
        let _held = throttle.try_acquire_at(start, WINDOW, false).unwrap();
        assert!(throttle
            .try_acquire_at(start + Duration::from_secs(60), WINDOW, false)
            .is_none());
    }

    #[test]
    fn zero_interval_only_checks_the_cooldown() {
        let throttle = FetchThrottle::new();
        let start = Instant::now();
        let permit = throttle.try_acquire_at(start, Duration::ZERO, false).unwrap();
        assert!(throttle.try_acquire_at(start, Duration::ZERO, false).is_none());
        throttle.release(permit);
        assert!(throttle.try_acquire_at(start, Duration::ZERO, false).is_some());
    }

    #[test]
    fn stale_release_keeps_newer_cooldown() {
        let throttle = FetchThrottle::new();
        let start = Instant::now();
        let old = throttle.try_acquire_at(start, WINDOW, true).unwrap();
        let _new = throttle.try_acquire_at(start, WINDOW, true).unwrap();
        throttle.release(old);
        assert!(throttle.in_cooldown());
    }

    #[tokio::test(start_paused = true)]
    async fn release_after_clears_cooldown_once_the_delay_passes() {
        let throttle = Arc::new(FetchThrottle::new());
        let permit = throttle.try_acquire(WINDOW, false).unwrap();
        throttle.release_after(permit, FetchTrigger::PostMutation.cooldown());

        tokio::time::sleep(Duration::from_millis(2_999)).await;
        assert!(throttle.in_cooldown());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!throttle.in_cooldown());
    }
}
