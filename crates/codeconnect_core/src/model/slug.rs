//! Slug derivation.
//!
//! # Invariants
//! - Output contains only `[a-z0-9-]` and is never empty.
//! - The uniqueness token strictly increases within one process, so no two
//!   calls return the same slug.
//! - Non-ASCII characters are treated like any other separator and dropped.
//! - Stores that outlive the process call [`advance_slug_token_past`] with
//!   their highest persisted token before any new slug is issued.

use crate::model::now_epoch_ms;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};

static NON_SLUG_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));
static LAST_SLUG_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Derives a unique slug from a display name.
pub fn slugify(name: &str) -> String {
    let base = slug_base(name);
    let token = next_slug_token();
    if base.is_empty() {
        token.to_string()
    } else {
        format!("{base}-{token}")
    }
}

/// Lowercases `name` and collapses every run outside `[a-z0-9]` into `-`.
///
/// Leading and trailing separators are trimmed.
pub fn slug_base(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    NON_SLUG_RUN_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Returns the next uniqueness token: wall-clock millis, bumped past the
/// previously issued token when the clock has not advanced.
pub fn next_slug_token() -> u64 {
    let now = u64::try_from(now_epoch_ms()).unwrap_or(0);
    let mut previous = LAST_SLUG_TOKEN.load(Ordering::Acquire);
    loop {
        let candidate = now.max(previous.saturating_add(1));
        match LAST_SLUG_TOKEN.compare_exchange_weak(
            previous,
            candidate,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return candidate,
            Err(actual) => previous = actual,
        }
    }
}

/// Token part of a slug produced by [`slugify`].
pub fn slug_token_of(slug: &str) -> Option<u64> {
    slug.rsplit('-').next()?.parse().ok()
}

/// Moves the token counter to at least `token`, so later slugs sort after
/// slugs persisted by earlier processes.
pub fn advance_slug_token_past(token: u64) {
    LAST_SLUG_TOKEN.fetch_max(token, Ordering::AcqRel);
}
