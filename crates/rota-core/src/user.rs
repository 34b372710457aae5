#![forbid(unsafe_code)]

//! The acting user, stamped onto every change-log entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal profile of the person operating the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
}

impl UserProfile {
    /// Create a profile with a fresh identity.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
        }
    }
}
