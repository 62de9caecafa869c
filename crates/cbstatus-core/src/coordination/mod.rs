//! Pipeline coordination

pub mod reporter;

pub use reporter::StatusReporter;
