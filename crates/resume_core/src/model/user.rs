//! Read-only projection of the owning user.
//!
//! Users are owned by the external store; core code only reads them.

use super::transaction::UserId;

/// User row as fetched inside a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Notification destination.
    pub email: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}
