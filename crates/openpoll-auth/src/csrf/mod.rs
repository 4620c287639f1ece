//! Anti-forgery token issuance and single-use validation.

mod guard;

pub use guard::CsrfGuard;
