//! Business logic and port definitions for botgate.
//!
//! This crate defines the "ports" (repository, asset and job traits) that the
//! infrastructure layer implements, the authorization policy, and the
//! services built on them. It depends only on `botgate-types` -- never on
//! `botgate-infra` or any database/IO crate.

pub mod policy;
pub mod repository;
pub mod service;
