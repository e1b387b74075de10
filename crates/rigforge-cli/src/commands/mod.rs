//! CLI command implementations

pub mod batch_validate;
pub mod generate;
pub mod lint;
pub mod validate;
