//! PostgreSQL store adapter.
//!
//! Every read joins contacts with their `addresses` and `bank_accounts`
//! rows explicitly. Payments are loaded in two steps: the filtered
//! `payments` rows first, then all referenced contacts in one `ANY($1)`
//! query.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, QueryBuilder, Transaction};

use crate::{
    db::DbPool,
    models::{
        contact::{Address, BankAccount, Contact, NewContact},
        filter::PaymentFilter,
        payment::{Payment, PaymentRecord},
    },
    store::{ContactStore, Database, PaymentStore, StorageError, UnitOfWork},
};

const CONTACT_SELECT: &str = r#"
    SELECT c.id, c.name, c.created_at, c.updated_at,
           a.id AS address_id, a.address_line1, a.address_line2, a.address_line3,
           a.city, a.postal_code, a.country_code,
           a.created_at AS address_created_at, a.updated_at AS address_updated_at,
           b.id AS account_id, b.account_number, b.bic,
           b.created_at AS account_created_at, b.updated_at AS account_updated_at
    FROM contacts c
    JOIN addresses a ON a.contact_id = c.id
    JOIN bank_accounts b ON b.contact_id = c.id
"#;

const PAYMENT_SELECT: &str = r#"
    SELECT id, amount, payment_currency, originator_id, beneficiary_id,
           charges_bearer, details, reference_number, created_at, updated_at
    FROM payments
"#;

/// One contact joined with its address and bank account.
#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    address_id: i64,
    address_line1: String,
    address_line2: Option<String>,
    address_line3: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country_code: String,
    address_created_at: DateTime<Utc>,
    address_updated_at: DateTime<Utc>,
    account_id: i64,
    account_number: String,
    bic: String,
    account_created_at: DateTime<Utc>,
    account_updated_at: DateTime<Utc>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: Address {
                id: row.address_id,
                contact_id: row.id,
                address_line1: row.address_line1,
                address_line2: row.address_line2,
                address_line3: row.address_line3,
                city: row.city,
                postal_code: row.postal_code,
                country_code: row.country_code,
                created_at: row.address_created_at,
                updated_at: row.address_updated_at,
            },
            account: BankAccount {
                id: row.account_id,
                contact_id: row.id,
                account_number: row.account_number,
                bic: row.bic,
                created_at: row.account_created_at,
                updated_at: row.account_updated_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A `payments` row before its contacts are attached.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    amount: Decimal,
    payment_currency: String,
    originator_id: i64,
    beneficiary_id: i64,
    charges_bearer: String,
    details: String,
    reference_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self, contacts: &HashMap<i64, Contact>) -> Result<Payment, StorageError> {
        let id = self.id;
        let contact = |contact_id: i64| {
            contacts.get(&contact_id).cloned().ok_or_else(|| {
                StorageError::Corrupt(format!("payment {id} references missing contact {contact_id}"))
            })
        };
        let originator = contact(self.originator_id)?;
        let beneficiary = contact(self.beneficiary_id)?;
        let charges_bearer = self
            .charges_bearer
            .parse()
            .map_err(|err| StorageError::Corrupt(format!("payment {id}: {err}")))?;

        Ok(Payment {
            id,
            amount: self.amount,
            payment_currency: self.payment_currency,
            originator_id: self.originator_id,
            originator,
            beneficiary_id: self.beneficiary_id,
            beneficiary,
            charges_bearer,
            details: self.details,
            reference_number: self.reference_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// PostgreSQL-backed [`Database`].
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: DbPool,
}

impl PgDatabase {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A PostgreSQL transaction. sqlx rolls it back if it is dropped unfinished.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> Result<&mut PgConnection, StorageError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| StorageError::Unavailable("transaction already finished".to_string()))
    }

    async fn load_contacts(&mut self, ids: Vec<i64>) -> Result<HashMap<i64, Contact>, StorageError> {
        let conn = self.conn()?;
        let rows = sqlx::query_as::<_, ContactRow>(&format!("{CONTACT_SELECT} WHERE c.id = ANY($1)"))
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.id, Contact::from(row)))
            .collect())
    }

    async fn attach_contacts(&mut self, rows: Vec<PaymentRow>) -> Result<Vec<Payment>, StorageError> {
        let mut ids: Vec<i64> = rows
            .iter()
            .flat_map(|row| [row.originator_id, row.beneficiary_id])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let contacts = self.load_contacts(ids).await?;
        rows.into_iter()
            .map(|row| row.into_payment(&contacts))
            .collect()
    }
}

#[async_trait]
impl ContactStore for PgUnitOfWork {
    async fn find_contact_by_name(&mut self, name: &str) -> Result<Option<Contact>, StorageError> {
        let conn = self.conn()?;
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "{CONTACT_SELECT} WHERE c.name = $1 ORDER BY c.id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Contact::from))
    }

    async fn find_contact(&mut self, id: i64) -> Result<Option<Contact>, StorageError> {
        let conn = self.conn()?;
        let row = sqlx::query_as::<_, ContactRow>(&format!("{CONTACT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(Contact::from))
    }

    async fn add_contact(&mut self, contact: NewContact) -> Result<Contact, StorageError> {
        let conn = self.conn()?;

        let id: i64 = sqlx::query_scalar("INSERT INTO contacts (name) VALUES ($1) RETURNING id")
            .bind(&contact.name)
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO addresses (
                contact_id,
                address_line1,
                address_line2,
                address_line3,
                city,
                postal_code,
                country_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&contact.address.address_line1)
        .bind(&contact.address.address_line2)
        .bind(&contact.address.address_line3)
        .bind(&contact.address.city)
        .bind(&contact.address.postal_code)
        .bind(&contact.address.country_code)
        .execute(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO bank_accounts (contact_id, account_number, bic) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&contact.account.account_number)
            .bind(&contact.account.bic)
            .execute(&mut *conn)
            .await?;

        self.find_contact(id)
            .await?
            .ok_or_else(|| StorageError::Corrupt(format!("inserted contact {id} is not readable")))
    }

    async fn update_contact(&mut self, contact: &Contact) -> Result<Contact, StorageError> {
        let conn = self.conn()?;

        let updated = sqlx::query("UPDATE contacts SET name = $2, updated_at = NOW() WHERE id = $1")
            .bind(contact.id)
            .bind(&contact.name)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(StorageError::MissingRecord(format!("contact {}", contact.id)));
        }

        let address = &contact.address;
        sqlx::query(
            r#"
            UPDATE addresses
            SET address_line1 = $2,
                address_line2 = $3,
                address_line3 = $4,
                city = $5,
                postal_code = $6,
                country_code = $7,
                updated_at = NOW()
            WHERE contact_id = $1
            "#,
        )
        .bind(contact.id)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.address_line3)
        .bind(&address.city)
        .bind(&address.postal_code)
        .bind(&address.country_code)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            UPDATE bank_accounts
            SET account_number = $2,
                bic = $3,
                updated_at = NOW()
            WHERE contact_id = $1
            "#,
        )
        .bind(contact.id)
        .bind(&contact.account.account_number)
        .bind(&contact.account.bic)
        .execute(&mut *conn)
        .await?;

        self.find_contact(contact.id)
            .await?
            .ok_or_else(|| StorageError::MissingRecord(format!("contact {}", contact.id)))
    }

    async fn list_contacts(&mut self) -> Result<Vec<Contact>, StorageError> {
        let conn = self.conn()?;
        let rows = sqlx::query_as::<_, ContactRow>(&format!("{CONTACT_SELECT} ORDER BY c.id"))
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    async fn lock_contact_name(&mut self, name: &str) -> Result<(), StorageError> {
        // Released automatically at commit or rollback.
        let conn = self.conn()?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(name)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl PaymentStore for PgUnitOfWork {
    async fn find_payment(&mut self, id: i64) -> Result<Option<Payment>, StorageError> {
        let conn = self.conn()?;
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{PAYMENT_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(self.attach_contacts(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn add_payment(&mut self, payment: PaymentRecord) -> Result<Payment, StorageError> {
        let conn = self.conn()?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO payments (
                amount,
                payment_currency,
                originator_id,
                beneficiary_id,
                charges_bearer,
                details,
                reference_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(payment.amount)
        .bind(&payment.payment_currency)
        .bind(payment.originator_id)
        .bind(payment.beneficiary_id)
        .bind(payment.charges_bearer.as_str())
        .bind(&payment.details)
        .bind(&payment.reference_number)
        .fetch_one(&mut *conn)
        .await?;

        self.find_payment(id)
            .await?
            .ok_or_else(|| StorageError::Corrupt(format!("inserted payment {id} is not readable")))
    }

    async fn query_payments(&mut self, filter: &PaymentFilter) -> Result<Vec<Payment>, StorageError> {
        let mut query = QueryBuilder::<Postgres>::new(PAYMENT_SELECT);
        query.push(" WHERE TRUE");

        if let Some(ids) = &filter.ids {
            query
                .push(" AND id = ANY(")
                .push_bind(ids.iter().copied().collect::<Vec<i64>>())
                .push(")");
        }
        if let Some(from) = filter.from {
            query.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND created_at <= ").push_bind(to);
        }
        if let Some(min) = filter.min_amount {
            query.push(" AND amount >= ").push_bind(min);
        }
        if let Some(max) = filter.max_amount {
            query.push(" AND amount <= ").push_bind(max);
        }

        let conn = self.conn()?;
        let rows = query
            .build_query_as::<PaymentRow>()
            .fetch_all(&mut *conn)
            .await?;

        self.attach_contacts(rows).await
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(&mut self) -> Result<(), StorageError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| StorageError::Unavailable("transaction already finished".to_string()))?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
