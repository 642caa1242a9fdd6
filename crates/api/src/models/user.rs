//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use toko_core::{UserId, Username};

/// A shop account.
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
