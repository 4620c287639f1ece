//! Ownership and public-view authorization checks.

mod checker;

pub use checker::{PollAction, PollAuthorizer};
