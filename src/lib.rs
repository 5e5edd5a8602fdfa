//! Quota-gated food-log history persistence and sync layer.
//!
//! The library is the core: quota evaluation, the dual-tier record store
//! (ephemeral local blob vs durable remote rows with soft-delete), the
//! debounced search coordinator, and the aggregate reporter. The binary in
//! `main.rs` is a thin HTTP surface over the durable tier.

pub mod analytics;
pub mod app;
pub mod auth;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod history;
pub mod inference;
pub mod quota;
pub mod state;
pub mod storage;
