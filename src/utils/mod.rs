//! Shared utilities: comment stripping, state validation.

pub mod comments;
pub mod validation;

pub use comments::strip_line_comments;
pub use validation::{validate_state, StateViolation};
