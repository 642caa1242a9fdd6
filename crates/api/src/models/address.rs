//! Shipping address domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use toko_core::{AddressId, UserId};

/// Label used when the client does not name an address.
pub const DEFAULT_LABEL: &str = "Rumah";

/// A stored shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Free-form tag such as "Rumah", "Kantor" or "Kost".
    pub label: String,
    /// Recipient name (may differ from the account name).
    pub name: String,
    pub phone: String,
    pub full_address: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub label: String,
    pub name: String,
    pub phone: String,
    pub full_address: String,
    pub is_primary: bool,
}

/// Partial address update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPatch {
    pub label: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub full_address: Option<String>,
    pub is_primary: Option<bool>,
}

impl AddressPatch {
    /// A patch that only changes the primary flag.
    #[must_use]
    pub fn primary(is_primary: bool) -> Self {
        Self {
            is_primary: Some(is_primary),
            ..Self::default()
        }
    }

    /// Apply the patch to an address in place.
    pub fn apply_to(&self, address: &mut Address) {
        if let Some(label) = &self.label {
            address.label.clone_from(label);
        }
        if let Some(name) = &self.name {
            address.name.clone_from(name);
        }
        if let Some(phone) = &self.phone {
            address.phone.clone_from(phone);
        }
        if let Some(full_address) = &self.full_address {
            address.full_address.clone_from(full_address);
        }
        if let Some(is_primary) = self.is_primary {
            address.is_primary = is_primary;
        }
    }
}
