//! Persistence ports and their adapters.
//!
//! A [`Database`] hands out [`UnitOfWork`]s. A unit of work wraps one
//! storage transaction and implements both [`ContactStore`] and
//! [`PaymentStore`], so every store call made through it joins the same
//! transaction. Stores never commit or roll back; the caller does.
//!
//! Adapters:
//! - [`postgres::PgDatabase`]: PostgreSQL through sqlx
//! - [`memory::MemoryDatabase`]: in-process store for tests

use async_trait::async_trait;

use crate::models::{
    contact::{Contact, NewContact},
    filter::PaymentFilter,
    payment::{Payment, PaymentRecord},
};

pub mod memory;
pub mod postgres;

/// Errors raised by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Query, commit or connection failure reported by sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record expected to exist is gone.
    #[error("record not found: {0}")]
    MissingRecord(String),

    /// Stored data does not fit the domain model.
    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Contact persistence. Contacts always come back with their address and
/// bank account loaded.
#[async_trait]
pub trait ContactStore: Send {
    /// Exact-match lookup by name. The oldest contact wins when several
    /// share a name.
    async fn find_contact_by_name(&mut self, name: &str) -> Result<Option<Contact>, StorageError>;

    async fn find_contact(&mut self, id: i64) -> Result<Option<Contact>, StorageError>;

    /// Insert a contact with its address and bank account.
    async fn add_contact(&mut self, contact: NewContact) -> Result<Contact, StorageError>;

    /// Persist the name, address and bank account fields of an existing
    /// contact and refresh its `updated_at`.
    async fn update_contact(&mut self, contact: &Contact) -> Result<Contact, StorageError>;

    async fn list_contacts(&mut self) -> Result<Vec<Contact>, StorageError>;

    /// Block other units of work resolving `name` until this one ends.
    async fn lock_contact_name(&mut self, name: &str) -> Result<(), StorageError>;
}

/// Payment persistence. Payments always come back with both contacts
/// loaded.
#[async_trait]
pub trait PaymentStore: Send {
    async fn find_payment(&mut self, id: i64) -> Result<Option<Payment>, StorageError>;

    /// Insert a payment between two existing contacts.
    async fn add_payment(&mut self, payment: PaymentRecord) -> Result<Payment, StorageError>;

    /// Payments matching every supplied filter, in no particular order.
    async fn query_payments(&mut self, filter: &PaymentFilter) -> Result<Vec<Payment>, StorageError>;
}

/// One storage transaction.
///
/// Dropping an unfinished unit of work discards its changes.
#[async_trait]
pub trait UnitOfWork: ContactStore + PaymentStore {
    async fn commit(&mut self) -> Result<(), StorageError>;

    async fn rollback(&mut self) -> Result<(), StorageError>;
}

/// Storage backend shared by all requests.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}
