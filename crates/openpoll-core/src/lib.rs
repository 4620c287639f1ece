//! # openpoll-core
//!
//! Core crate for the OpenPoll security subsystem. Contains configuration
//! schemas, security event types, the unified error system, and the trait
//! seams behind which every external collaborator (identity provider, poll
//! storage, key-value store, event sink) sits.
//!
//! This crate has **no** internal dependencies on other OpenPoll crates.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
