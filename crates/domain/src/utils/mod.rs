//! Small pure helpers used by domain types

pub mod serde;
pub mod url;
