//! Shared domain types for botgate.
//!
//! Bots, tenants, actors, credentials and their outward views, plus the
//! error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod actor;
pub mod bot;
pub mod config;
pub mod credential;
pub mod error;
pub mod job;
pub mod view;
