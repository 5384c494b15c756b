//! Infrastructure layer: job store backends.

pub mod jobs;

pub use jobs::InMemoryJobStore;
