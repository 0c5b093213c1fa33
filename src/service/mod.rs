//! Service Layer
//!
//! Hosts the deterministic engine for many concurrent users.
//! This layer is **non-deterministic** (clocks, scheduling); every economy
//! rule still runs through `game/`.

pub mod clock;
pub mod sync;
pub mod store;

pub use clock::{Clock, MonotonicClock, ManualClock};
pub use sync::{SnapshotSink, SnapshotError, UserSnapshot, MemorySink, ChannelSink, NullSink};
pub use store::{UserStore, StoreError, TapReport};
