//! Infrastructure adapters. Implement outbound ports.
//!
//! AI providers, the hosted backend, the terminal client. Map errors to DomainError.

pub mod ai;
pub mod backend;
pub mod ui;
