//! Client-resident session lifecycle monitoring.

mod monitor;
mod phase;

pub use monitor::SessionMonitor;
pub use phase::SessionPhase;
