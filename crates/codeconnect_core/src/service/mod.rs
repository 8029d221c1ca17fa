//! Core use-case services.
//!
//! # Responsibility
//! - Turn request-level intents into validated store calls.
//! - Keep the HTTP layer decoupled from storage details.

pub mod resource_service;
pub mod seed;
