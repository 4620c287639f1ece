//! Per-action rate limiting over the injected key-value store.

pub mod limiter;
pub mod policy;
pub mod throttle;

pub use limiter::{RateDecision, RateLimiter};
pub use policy::RateLimitAction;
pub use throttle::{LoginThrottle, LoginThrottleStatus};
