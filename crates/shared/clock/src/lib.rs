//! Aegis Clock Infrastructure
//!
//! Two implementations of the [`Clock`] port:
//!
//! - [`SystemClock`]: wall-clock time, for live runs
//! - [`ManualClock`]: frozen time that only moves when told to, for tests
//!   and replays where hold times and cooldowns must be deterministic
//!
//! ```ignore
//! use aegis_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(start);
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now(), start + Duration::minutes(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use aegis_ports::Clock;
