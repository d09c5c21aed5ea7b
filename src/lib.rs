//! iaso-med: patient/doctor health portal client with AI report analysis, in Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
