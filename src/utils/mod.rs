//! Shared utilities.

mod verification;

pub use verification::verification_code;
