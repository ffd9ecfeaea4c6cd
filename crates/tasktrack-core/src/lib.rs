//! # Tasktrack Core
//!
//! The domain layer of the Tasktrack backend.
//! This crate holds the admission (rate limiting) and comment read/write
//! services together with the ports their infrastructure must implement.
//! It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
