//! crates/dairy_track_core/src/single_flight.rs
//!
//! Coalesces concurrent calls to the same operation. The first caller starts
//! the work; everyone arriving while it is outstanding awaits the same result.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

pub struct SingleFlight<K, T>
where
    T: Clone,
{
    inflight: Mutex<HashMap<K, Shared<BoxFuture<'static, T>>>>,
}

impl<K, T> Default for SingleFlight<K, T>
where
    T: Clone,
{
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the future built by `start` unless one is already outstanding for `key`,
    /// in which case the existing one is awaited instead and `start` is never called.
    pub async fn run<F>(&self, key: K, start: F) -> T
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let flight = {
            let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
            match inflight.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let flight = start().shared();
                    inflight.insert(key.clone(), flight.clone());
                    flight
                }
            }
        };

        let output = flight.clone().await;

        // Whoever finishes first clears the slot, but only if it still holds this flight.
        let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
        if inflight
            .get(&key)
            .is_some_and(|current| Shared::ptr_eq(current, &flight))
        {
            inflight.remove(&key);
        }
        output
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(key)
    }
}
