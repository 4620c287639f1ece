//! Core traits defined in `openpoll-core` and implemented by other
//! crates or by the hosting application's adapters.

pub mod audit;
pub mod identity;
pub mod kv;
pub mod notify;
pub mod polls;

pub use audit::{EscalationHook, NoopEscalation, SecurityEventSink};
pub use identity::{IdentityProvider, ProviderSession, ProviderUser};
pub use kv::KeyValueStore;
pub use notify::{NoopNotifier, SessionNotifier};
pub use polls::{NewPoll, PollStore};
