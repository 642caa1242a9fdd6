//! Address book with a single primary address per user.
//!
//! Whenever a user has at least one address, exactly one is primary. Creating
//! or updating an address as primary demotes the others first; demoting or
//! deleting the primary promotes the most recently created remaining address.
//! Each sequence runs under the user's lock.

use serde::Deserialize;

use toko_core::{AddressId, UserId};

use super::{ShopError, UserLocks};
use crate::db::AddressStore;
use crate::models::address::DEFAULT_LABEL;
use crate::models::{Address, AddressPatch, NewAddress};

/// Address fields as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    pub label: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub full_address: Option<String>,
    pub is_primary: Option<bool>,
}

/// Address operations for a single request.
pub struct AddressBook<'a> {
    addresses: &'a dyn AddressStore,
    locks: &'a UserLocks,
}

impl<'a> AddressBook<'a> {
    #[must_use]
    pub const fn new(addresses: &'a dyn AddressStore, locks: &'a UserLocks) -> Self {
        Self { addresses, locks }
    }

    /// The user's addresses, primary first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if the store fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, ShopError> {
        Ok(self.addresses.list(user_id).await?)
    }

    /// Add an address. The user's first address is always primary.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::IncompleteAddress` if name, phone or full address is
    /// missing or blank.
    #[tracing::instrument(skip(self, form))]
    pub async fn create(&self, user_id: UserId, form: AddressForm) -> Result<Address, ShopError> {
        let (Some(name), Some(phone), Some(full_address)) = (
            non_empty(form.name),
            non_empty(form.phone),
            non_empty(form.full_address),
        ) else {
            return Err(ShopError::IncompleteAddress);
        };

        let _guard = self.locks.lock(user_id).await;

        let first = self.addresses.count(user_id).await? == 0;
        let is_primary = first || form.is_primary.unwrap_or(false);
        if is_primary {
            self.addresses.demote_all(user_id, None).await?;
        }

        let address = self
            .addresses
            .insert(
                user_id,
                &NewAddress {
                    label: non_empty(form.label).unwrap_or_else(|| DEFAULT_LABEL.to_owned()),
                    name,
                    phone,
                    full_address,
                    is_primary,
                },
            )
            .await?;

        tracing::info!(address_id = %address.id, is_primary, "Address created");
        Ok(address)
    }

    /// Update supplied fields of an address. Blank strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for a malformed, unknown or foreign id.
    #[tracing::instrument(skip(self, form))]
    pub async fn update(
        &self,
        user_id: UserId,
        raw_id: &str,
        form: AddressForm,
    ) -> Result<Address, ShopError> {
        let id = parse_address_id(raw_id)?;
        let mut patch = AddressPatch {
            label: non_empty(form.label),
            name: non_empty(form.name),
            phone: non_empty(form.phone),
            full_address: non_empty(form.full_address),
            is_primary: form.is_primary,
        };

        let _guard = self.locks.lock(user_id).await;

        let current = self
            .addresses
            .get(user_id, id)
            .await?
            .ok_or_else(|| ShopError::not_found("address"))?;

        let mut successor = None;
        match patch.is_primary {
            Some(true) => {
                self.addresses.demote_all(user_id, Some(id)).await?;
            }
            Some(false) if current.is_primary => {
                successor = self.newest_other(user_id, id).await?;
                if successor.is_none() {
                    // The only address stays primary.
                    patch.is_primary = None;
                }
            }
            _ => {}
        }

        let updated = self
            .addresses
            .update(user_id, id, &patch)
            .await?
            .ok_or_else(|| ShopError::not_found("address"))?;

        if let Some(successor) = successor {
            self.addresses
                .update(user_id, successor, &AddressPatch::primary(true))
                .await?;
            tracing::info!(address_id = %successor, "Promoted address to primary");
        }

        Ok(updated)
    }

    /// Delete an address, promoting a successor if it was the primary one.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for a malformed, unknown or foreign id.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, raw_id: &str) -> Result<(), ShopError> {
        let id = parse_address_id(raw_id)?;

        let _guard = self.locks.lock(user_id).await;

        let current = self
            .addresses
            .get(user_id, id)
            .await?
            .ok_or_else(|| ShopError::not_found("address"))?;

        if !self.addresses.delete(user_id, id).await? {
            return Err(ShopError::not_found("address"));
        }

        if current.is_primary
            && let Some(successor) = self.newest_other(user_id, id).await?
        {
            self.addresses
                .update(user_id, successor, &AddressPatch::primary(true))
                .await?;
            tracing::info!(address_id = %successor, "Promoted address to primary");
        }

        Ok(())
    }

    /// The most recently created address of the user other than `except`.
    async fn newest_other(
        &self,
        user_id: UserId,
        except: AddressId,
    ) -> Result<Option<AddressId>, ShopError> {
        let addresses = self.addresses.list(user_id).await?;
        Ok(addresses
            .iter()
            .filter(|a| a.id != except)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|a| a.id))
    }
}

fn parse_address_id(raw: &str) -> Result<AddressId, ShopError> {
    raw.parse().map_err(|_| ShopError::not_found("address"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const USER: UserId = UserId::new(1);

    fn form(name: &str, is_primary: bool) -> AddressForm {
        AddressForm {
            label: None,
            name: Some(name.to_owned()),
            phone: Some("1".to_owned()),
            full_address: Some("X".to_owned()),
            is_primary: Some(is_primary),
        }
    }

    async fn primaries(store: &MemoryStore) -> Vec<AddressId> {
        store
            .list(USER)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.is_primary)
            .map(|a| a.id)
            .collect()
    }

    #[tokio::test]
    async fn test_first_address_forced_primary() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);

        let address = book.create(USER, form("A", false)).await.unwrap();
        assert!(address.is_primary);
        assert_eq!(address.label, "Rumah");

        let second = book.create(USER, form("B", false)).await.unwrap();
        assert!(!second.is_primary);
    }

    #[tokio::test]
    async fn test_incomplete_address_rejected() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);

        let blank_phone = AddressForm {
            phone: Some("  ".to_owned()),
            ..form("A", false)
        };
        let missing_name = AddressForm {
            name: None,
            ..form("A", false)
        };
        for bad in [blank_phone, missing_name] {
            assert!(matches!(
                book.create(USER, bad).await,
                Err(ShopError::IncompleteAddress)
            ));
        }
        assert!(book.list(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exactly_one_primary_after_any_sequence() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);

        let a = book.create(USER, form("A", false)).await.unwrap();
        assert_eq!(primaries(&store).await, vec![a.id]);

        let b = book.create(USER, form("B", true)).await.unwrap();
        assert_eq!(primaries(&store).await, vec![b.id]);

        let c = book.create(USER, form("C", false)).await.unwrap();
        assert_eq!(primaries(&store).await, vec![b.id]);

        book.update(USER, &a.id.to_string(), form("A2", true))
            .await
            .unwrap();
        assert_eq!(primaries(&store).await, vec![a.id]);

        // Demoting the primary hands the flag to the newest other address.
        book.update(
            USER,
            &a.id.to_string(),
            AddressForm {
                is_primary: Some(false),
                ..AddressForm::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(primaries(&store).await, vec![c.id]);

        // Un-flagging a non-primary changes nothing.
        book.update(
            USER,
            &b.id.to_string(),
            AddressForm {
                is_primary: Some(false),
                ..AddressForm::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(primaries(&store).await, vec![c.id]);
    }

    #[tokio::test]
    async fn test_sole_address_cannot_be_demoted() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);
        let a = book.create(USER, form("A", true)).await.unwrap();

        let updated = book
            .update(USER, &a.id.to_string(), form("A", false))
            .await
            .unwrap();
        assert!(updated.is_primary);
    }

    #[tokio::test]
    async fn test_update_treats_blank_as_absent() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);
        let a = book.create(USER, form("Hanifa", false)).await.unwrap();

        let updated = book
            .update(
                USER,
                &a.id.to_string(),
                AddressForm {
                    label: Some("Kantor".to_owned()),
                    name: Some(String::new()),
                    phone: Some(" ".to_owned()),
                    full_address: None,
                    is_primary: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.label, "Kantor");
        assert_eq!(updated.name, "Hanifa");
        assert_eq!(updated.phone, "1");
        assert_eq!(updated.full_address, "X");
    }

    #[tokio::test]
    async fn test_update_and_delete_not_found() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);
        let a = book.create(USER, form("A", false)).await.unwrap();
        let stranger = UserId::new(2);

        assert!(matches!(
            book.update(stranger, &a.id.to_string(), form("B", true)).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(
            book.update(USER, "not-an-id", form("B", true)).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(
            book.delete(stranger, &a.id.to_string()).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(
            book.delete(USER, "999").await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_primary_promotes_most_recent() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);
        let a = book.create(USER, form("A", false)).await.unwrap();
        let _b = book.create(USER, form("B", false)).await.unwrap();
        let c = book.create(USER, form("C", false)).await.unwrap();

        book.delete(USER, &a.id.to_string()).await.unwrap();
        assert_eq!(primaries(&store).await, vec![c.id]);

        book.delete(USER, &c.id.to_string()).await.unwrap();
        let remaining = book.list(USER).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_primary);
    }

    #[tokio::test]
    async fn test_deleting_non_primary_keeps_primary() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);
        let a = book.create(USER, form("A", false)).await.unwrap();
        let b = book.create(USER, form("B", false)).await.unwrap();

        book.delete(USER, &b.id.to_string()).await.unwrap();
        assert_eq!(primaries(&store).await, vec![a.id]);
    }

    #[tokio::test]
    async fn test_list_primary_first_then_newest() {
        let store = MemoryStore::new();
        let locks = UserLocks::new();
        let book = AddressBook::new(&store, &locks);
        let a = book.create(USER, form("A", false)).await.unwrap();
        let b = book.create(USER, form("B", false)).await.unwrap();
        let c = book.create(USER, form("C", false)).await.unwrap();

        let ids: Vec<_> = book
            .list(USER)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![a.id, c.id, b.id]);
    }
}
