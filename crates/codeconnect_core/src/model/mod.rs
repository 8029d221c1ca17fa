//! Resource hierarchy domain model.
//!
//! # Responsibility
//! - Define the Organization → Project → File records shared by stores,
//!   services and the HTTP surface.
//! - Own the pure derivation rules (slugs, default content, language tags).
//!
//! # Invariants
//! - Every stored entity is identified by a generator-assigned opaque id.
//! - Parent references are set at construction and never reassigned.
//! - Timestamps are Unix epoch milliseconds.

pub mod file;
pub mod language;
pub mod organization;
pub mod principal;
pub mod project;
pub mod slug;

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque identifier for organizations, projects and files.
///
/// Generated ids are UUID v4 text; synthesized resources use stable
/// derived values instead.
pub type ResourceId = String;

/// Generates a fresh opaque resource id.
pub fn new_resource_id() -> ResourceId {
    Uuid::new_v4().to_string()
}

/// Returns current wall-clock time in epoch milliseconds.
///
/// Clocks before the Unix epoch collapse to `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
