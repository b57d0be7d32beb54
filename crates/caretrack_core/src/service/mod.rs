//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into lifecycle and query APIs.
//! - Translate repository failures into the shared [`error::ServiceError`]
//!   taxonomy.
//!
//! # Invariants
//! - Services read "now" only through an injected [`crate::clock::Clock`].
//! - Status writes go through [`retry::RetryPolicy`].

pub mod client_service;
pub mod error;
pub mod lifecycle;
pub mod retry;
pub mod schedule_service;
pub mod status;
pub mod task_service;
