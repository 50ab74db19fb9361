pub mod diagnostic;
pub mod error;
pub mod types;
