use aegis_core::Timestamp;
use aegis_ports::Clock;
use chrono::Duration;
use std::sync::RwLock;

/// Clock frozen at a point in time, moved only by `advance` / `set`
///
/// Interior mutability lets one `Arc<ManualClock>` be shared between the
/// components under test and the test driving time forward.
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Move time forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Jump to an explicit time. Can move backwards.
    pub fn set(&self, time: Timestamp) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
