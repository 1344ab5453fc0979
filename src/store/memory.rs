//! In-process store adapter used by the test suite.
//!
//! Units of work are serialized: `begin` takes the store lock and holds it
//! until commit or rollback. Changes go to a private copy of the state,
//! which replaces the shared state on commit, so a rolled back or dropped
//! unit of work leaves nothing behind.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    models::{
        contact::{Address, BankAccount, Contact, NewContact},
        filter::PaymentFilter,
        payment::{Payment, PaymentRecord},
    },
    store::{ContactStore, Database, PaymentStore, StorageError, UnitOfWork},
};

/// A payment as stored: contacts by id only, like the `payments` table.
#[derive(Debug, Clone)]
struct StoredPayment {
    id: i64,
    record: PaymentRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    contacts: BTreeMap<i64, Contact>,
    payments: BTreeMap<i64, StoredPayment>,
    last_contact_id: i64,
    last_address_id: i64,
    last_account_id: i64,
    last_payment_id: i64,
}

impl MemoryState {
    fn payment(&self, stored: &StoredPayment) -> Result<Payment, StorageError> {
        let contact = |id: i64| {
            self.contacts.get(&id).cloned().ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "payment {} references missing contact {id}",
                    stored.id
                ))
            })
        };

        Ok(Payment {
            id: stored.id,
            amount: stored.record.amount,
            payment_currency: stored.record.payment_currency.clone(),
            originator_id: stored.record.originator_id,
            originator: contact(stored.record.originator_id)?,
            beneficiary_id: stored.record.beneficiary_id,
            beneficiary: contact(stored.record.beneficiary_id)?,
            charges_bearer: stored.record.charges_bearer,
            details: stored.record.details.clone(),
            reference_number: stored.record.reference_number.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

/// In-memory [`Database`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    fail_payment_inserts: Arc<AtomicBool>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `add_payment` fail until switched off again.
    pub fn fail_payment_inserts(&self, fail: bool) {
        self.fail_payment_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of committed contacts.
    pub async fn contact_count(&self) -> usize {
        self.state.lock().await.contacts.len()
    }

    /// Number of committed payments.
    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();

        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            working,
            fail_payment_inserts: Arc::clone(&self.fail_payment_inserts),
        }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Exclusive transaction over a [`MemoryDatabase`].
pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
    fail_payment_inserts: Arc<AtomicBool>,
}

impl MemoryUnitOfWork {
    fn state(&mut self) -> Result<&mut MemoryState, StorageError> {
        if self.guard.is_none() {
            return Err(StorageError::Unavailable(
                "unit of work already finished".to_string(),
            ));
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl ContactStore for MemoryUnitOfWork {
    async fn find_contact_by_name(&mut self, name: &str) -> Result<Option<Contact>, StorageError> {
        // BTreeMap iterates by id, so the oldest match comes first.
        Ok(self
            .state()?
            .contacts
            .values()
            .find(|contact| contact.name == name)
            .cloned())
    }

    async fn find_contact(&mut self, id: i64) -> Result<Option<Contact>, StorageError> {
        Ok(self.state()?.contacts.get(&id).cloned())
    }

    async fn add_contact(&mut self, contact: NewContact) -> Result<Contact, StorageError> {
        let state = self.state()?;
        let now = Utc::now();

        state.last_contact_id += 1;
        state.last_address_id += 1;
        state.last_account_id += 1;
        let id = state.last_contact_id;

        let stored = Contact {
            id,
            name: contact.name,
            address: Address {
                id: state.last_address_id,
                contact_id: id,
                address_line1: contact.address.address_line1,
                address_line2: contact.address.address_line2,
                address_line3: contact.address.address_line3,
                city: contact.address.city,
                postal_code: contact.address.postal_code,
                country_code: contact.address.country_code,
                created_at: now,
                updated_at: now,
            },
            account: BankAccount {
                id: state.last_account_id,
                contact_id: id,
                account_number: contact.account.account_number,
                bic: contact.account.bic,
                created_at: now,
                updated_at: now,
            },
            created_at: now,
            updated_at: now,
        };

        state.contacts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_contact(&mut self, contact: &Contact) -> Result<Contact, StorageError> {
        let state = self.state()?;
        let stored = state
            .contacts
            .get_mut(&contact.id)
            .ok_or_else(|| StorageError::MissingRecord(format!("contact {}", contact.id)))?;
        let now = Utc::now();

        stored.name = contact.name.clone();
        stored.updated_at = now;

        stored.address.address_line1 = contact.address.address_line1.clone();
        stored.address.address_line2 = contact.address.address_line2.clone();
        stored.address.address_line3 = contact.address.address_line3.clone();
        stored.address.city = contact.address.city.clone();
        stored.address.postal_code = contact.address.postal_code.clone();
        stored.address.country_code = contact.address.country_code.clone();
        stored.address.updated_at = now;

        stored.account.account_number = contact.account.account_number.clone();
        stored.account.bic = contact.account.bic.clone();
        stored.account.updated_at = now;

        Ok(stored.clone())
    }

    async fn list_contacts(&mut self) -> Result<Vec<Contact>, StorageError> {
        Ok(self.state()?.contacts.values().cloned().collect())
    }

    async fn lock_contact_name(&mut self, _name: &str) -> Result<(), StorageError> {
        // The whole store is already locked for this unit of work.
        self.state().map(|_| ())
    }
}

#[async_trait]
impl PaymentStore for MemoryUnitOfWork {
    async fn find_payment(&mut self, id: i64) -> Result<Option<Payment>, StorageError> {
        let state = self.state()?;
        state
            .payments
            .get(&id)
            .map(|stored| state.payment(stored))
            .transpose()
    }

    async fn add_payment(&mut self, payment: PaymentRecord) -> Result<Payment, StorageError> {
        if self.fail_payment_inserts.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "payment inserts are switched off".to_string(),
            ));
        }

        let state = self.state()?;
        for contact_id in [payment.originator_id, payment.beneficiary_id] {
            if !state.contacts.contains_key(&contact_id) {
                return Err(StorageError::MissingRecord(format!("contact {contact_id}")));
            }
        }

        state.last_payment_id += 1;
        let now = Utc::now();
        let stored = StoredPayment {
            id: state.last_payment_id,
            record: payment,
            created_at: now,
            updated_at: now,
        };

        let created = state.payment(&stored)?;
        state.payments.insert(stored.id, stored);
        Ok(created)
    }

    async fn query_payments(&mut self, filter: &PaymentFilter) -> Result<Vec<Payment>, StorageError> {
        let state = self.state()?;
        let mut payments = Vec::new();
        for stored in state.payments.values() {
            let payment = state.payment(stored)?;
            if filter.matches(&payment) {
                payments.push(payment);
            }
        }
        Ok(payments)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(&mut self) -> Result<(), StorageError> {
        let mut guard = self.guard.take().ok_or_else(|| {
            StorageError::Unavailable("unit of work already finished".to_string())
        })?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.guard = None;
        self.working = MemoryState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        contact::{NewAddress, NewBankAccount},
        payment::ChargesBearer,
    };
    use rust_decimal_macros::dec;

    fn new_contact(name: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            address: NewAddress {
                address_line1: "Main Str 1".to_string(),
                address_line2: None,
                address_line3: None,
                city: Some("Nicosia".to_string()),
                postal_code: None,
                country_code: "CY".to_string(),
            },
            account: NewBankAccount {
                account_number: "CY17002001280000001200527600".to_string(),
                bic: "BCYPCY2N".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn committed_changes_are_visible_to_later_units() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        let alice = uow.add_contact(new_contact("Alice")).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = db.begin().await.unwrap();
        let found = uow.find_contact_by_name("Alice").await.unwrap();
        assert_eq!(found, Some(alice));
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn rolled_back_changes_are_discarded() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        uow.add_contact(new_contact("Alice")).await.unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(db.contact_count().await, 0);
    }

    #[tokio::test]
    async fn dropped_unit_of_work_is_discarded() {
        let db = MemoryDatabase::new();

        {
            let mut uow = db.begin().await.unwrap();
            uow.add_contact(new_contact("Alice")).await.unwrap();
        }

        assert_eq!(db.contact_count().await, 0);
    }

    #[tokio::test]
    async fn finished_unit_of_work_rejects_operations() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        uow.commit().await.unwrap();

        assert!(matches!(
            uow.list_contacts().await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(uow.commit().await.is_err());
    }

    #[tokio::test]
    async fn payments_reference_existing_contacts() {
        let db = MemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();
        let alice = uow.add_contact(new_contact("Alice")).await.unwrap();

        let result = uow
            .add_payment(PaymentRecord {
                amount: dec!(10),
                payment_currency: "EUR".to_string(),
                originator_id: alice.id,
                beneficiary_id: 99,
                charges_bearer: ChargesBearer::Shared,
                details: "rent".to_string(),
                reference_number: None,
            })
            .await;

        assert!(matches!(result, Err(StorageError::MissingRecord(_))));
    }
}
