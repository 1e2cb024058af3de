//! Optional per-context counters.

use rhai::{Dynamic, Map};
use std::time::Duration;

/// What one context did while it was alive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Events delivered to the context's hook
    pub events: u64,
    /// Calls made into the host
    pub host_calls: u64,
    /// Time spent inside the context's hooks
    pub busy: Duration,
}

impl ContextStats {
    pub(crate) fn record_event(&mut self, elapsed: Duration) {
        self.events += 1;
        self.busy += elapsed;
    }

    pub(crate) fn record_host_call(&mut self) {
        self.host_calls += 1;
    }

    /// Script-side view: `#{ events, host_calls, busy_ms }`.
    pub fn to_map(&self) -> Map {
        let mut map = Map::new();
        map.insert("events".into(), Dynamic::from_int(saturating_int(self.events)));
        map.insert("host_calls".into(), Dynamic::from_int(saturating_int(self.host_calls)));
        map.insert("busy_ms".into(), Dynamic::from_float(self.busy.as_secs_f64() * 1000.0));
        map
    }
}

fn saturating_int(n: u64) -> rhai::INT {
    rhai::INT::try_from(n).unwrap_or(rhai::INT::MAX)
}
