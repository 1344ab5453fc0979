//! Contact data models and API request types.
//!
//! This module defines:
//! - `Contact`, `Address`, `BankAccount`: stored entities, always fully loaded
//! - `ContactRequest` and its nested request types: raw request bodies
//! - `NewContact`: a validated contact ready to be inserted

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::null_as_default;

/// Postal address owned by exactly one contact.
///
/// # Database Table
///
/// Maps to the `addresses` table. Rows are deleted together with their
/// contact (`ON DELETE CASCADE`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,

    /// Owning contact. Only the key is kept, never the contact itself.
    pub contact_id: i64,

    pub address_line1: String,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,

    /// ISO 3166 country code, e.g. "CY"
    pub country_code: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Overwrite every address field with the values of `fields`.
    ///
    /// Ids and timestamps are left alone; the store refreshes `updated_at`.
    pub fn apply(&mut self, fields: &NewAddress) {
        self.address_line1 = fields.address_line1.clone();
        self.address_line2 = fields.address_line2.clone();
        self.address_line3 = fields.address_line3.clone();
        self.city = fields.city.clone();
        self.postal_code = fields.postal_code.clone();
        self.country_code = fields.country_code.clone();
    }
}

/// Bank account owned by exactly one contact.
///
/// Maps to the `bank_accounts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: i64,
    pub contact_id: i64,
    pub account_number: String,
    pub bic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A party of a payment (originator or beneficiary).
///
/// # Database Table
///
/// Maps to the `contacts` table, joined with its single `addresses` row
/// and its single `bank_accounts` row. A `Contact` value is never
/// returned without both.
///
/// # Lookup
///
/// `name` is the natural key used to resolve payment parties. It is not
/// enforced unique by the schema; resolution picks the oldest row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub address: Address,
    pub account: BankAccount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for an address.
///
/// Every field defaults when missing or `null` so that absent values are
/// reported by validation instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub country_code: String,
}

/// Request body for a bank account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankAccountRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bic: String,
}

/// Request body for a contact, used by `POST /contact` and nested in
/// payment requests.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Test One",
///   "address": {
///     "addressLine1": "Test One Str",
///     "addressLine2": "3",
///     "postalCode": "532032",
///     "countryCode": "CY"
///   },
///   "account": {
///     "accountNumber": "ASD123123",
///     "bic": "BCYO12312"
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub address: Option<AddressRequest>,
    pub account: Option<BankAccountRequest>,
}

/// Validated address fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub address_line3: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: String,
}

/// Validated bank account fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBankAccount {
    pub account_number: String,
    pub bic: String,
}

/// Validated contact ready to be inserted.
///
/// Built only through [`crate::validation::Validate::validated`], so the
/// address and account are guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub address: NewAddress,
    pub account: NewBankAccount,
}

impl From<AddressRequest> for NewAddress {
    fn from(request: AddressRequest) -> Self {
        Self {
            address_line1: request.address_line1,
            address_line2: request.address_line2,
            address_line3: request.address_line3,
            city: request.city,
            postal_code: request.postal_code,
            country_code: request.country_code,
        }
    }
}

impl From<BankAccountRequest> for NewBankAccount {
    fn from(request: BankAccountRequest) -> Self {
        Self {
            account_number: request.account_number,
            bic: request.bic,
        }
    }
}
