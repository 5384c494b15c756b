//! HTTP API: background job orchestration, request lifetimes and routing.

pub mod app;
pub mod background;
pub mod config;
pub mod context;
pub mod middleware;
