//! Authenticated principal as handed over by the identity gate.
//!
//! The core never verifies credentials; it trusts whatever the gate built.

use serde::{Deserialize, Serialize};

/// The authenticated identity making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Provider-issued stable user id.
    pub id: String,
    /// Primary email, when the provider exposes one.
    pub email: Option<String>,
    /// "Full name" profile metadata.
    pub display_name: Option<String>,
    /// Account creation time in epoch milliseconds (`0` when unknown).
    pub created_at: i64,
}

impl Principal {
    /// Creates a principal that only carries its id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            created_at: 0,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Short human label: display name, else email local part, else id.
    pub fn handle(&self) -> &str {
        if let Some(name) = non_blank(self.display_name.as_deref()) {
            return name;
        }
        if let Some(email) = non_blank(self.email.as_deref()) {
            let local = email.split('@').next().unwrap_or(email).trim();
            if !local.is_empty() {
                return local;
            }
        }
        self.id.as_str()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
