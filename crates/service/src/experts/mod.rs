//! Expert-profile module: three-layer architecture (domain, repository, service).
//!
//! Centralizes expert search, registration, enablement, and verification-token
//! business logic under the service crate.

pub mod domain;
pub mod errors;
pub mod name;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::ExpertService;
