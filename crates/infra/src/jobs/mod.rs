//! Job store backends.
//!
//! Only an in-memory backend ships today. It satisfies the full
//! [`offload_core::JobStore`] contract, including the ping-after-complete
//! rule, and is what the API binary wires in.

pub mod store;

pub use store::InMemoryJobStore;
