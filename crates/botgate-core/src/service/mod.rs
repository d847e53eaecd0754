//! Business logic services (use cases).
//!
//! Services orchestrate repository calls, the external asset and job
//! pipelines, and business rules. They depend on traits (ports) -- never on
//! concrete infrastructure implementations.

pub mod asset;
pub mod credential;
pub mod hash;
pub mod identity;
pub mod job;
pub mod registry;
pub mod token;

#[cfg(test)]
mod testing;
