//! `offload-core`: job model and store contracts.
//!
//! This crate has no runtime or HTTP concerns; it defines what a background
//! job is and what a store has to guarantee about it.

pub mod error;
pub mod id;
pub mod job;
pub mod store;

pub use error::{InvalidJobId, JobStoreError, StoreResult};
pub use id::JobId;
pub use job::{Job, JobStatus, TerminalResult};
pub use store::{JobQuery, JobStore};
