//! Payment data models and API request types.
//!
//! This module defines:
//! - `Payment`: stored payment with both contacts resolved
//! - `PaymentRequest`: request body for `POST /payment`
//! - `NewPayment`: validated request, input of the create-payment workflow
//! - `PaymentRecord`: the row staged for insertion once contacts are resolved

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{
    contact::{Contact, ContactRequest, NewContact},
    null_as_default,
};

/// Which party pays the transfer charges.
///
/// Serialized as the variant name (`"Originator"`, `"Beneficiary"`,
/// `"Shared"`) both on the wire and in the `payments.charges_bearer` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargesBearer {
    Originator,
    Beneficiary,
    Shared,
}

impl ChargesBearer {
    pub fn as_str(self) -> &'static str {
        match self {
            ChargesBearer::Originator => "Originator",
            ChargesBearer::Beneficiary => "Beneficiary",
            ChargesBearer::Shared => "Shared",
        }
    }
}

impl fmt::Display for ChargesBearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored charges bearer is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown charges bearer: {0}")]
pub struct UnknownChargesBearer(pub String);

impl FromStr for ChargesBearer {
    type Err = UnknownChargesBearer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Originator" => Ok(ChargesBearer::Originator),
            "Beneficiary" => Ok(ChargesBearer::Beneficiary),
            "Shared" => Ok(ChargesBearer::Shared),
            other => Err(UnknownChargesBearer(other.to_string())),
        }
    }
}

/// A stored payment with both parties fully loaded.
///
/// # Database Table
///
/// Maps to the `payments` table. `originator_id` and `beneficiary_id` are
/// foreign keys into `contacts`; the matching contacts (with address and
/// bank account) are always attached.
///
/// Payments are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Currency code, e.g. "EUR"
    pub payment_currency: String,

    pub originator_id: i64,
    pub originator: Contact,

    pub beneficiary_id: i64,
    pub beneficiary: Contact,

    pub charges_bearer: ChargesBearer,
    pub details: String,
    pub reference_number: Option<String>,

    /// Insertion time; the `from`/`to` list filters compare against it.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a payment.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": 388.50,
///   "paymentCurrency": "EUR",
///   "originator": { "name": "Test One", "address": { ... }, "account": { ... } },
///   "beneficiary": { "name": "Test Two", "address": { ... }, "account": { ... } },
///   "chargesBearer": "Beneficiary",
///   "details": "This is a necessary payment",
///   "referenceNumber": "INV-42"
/// }
/// ```
///
/// Missing and `null` fields deserialize to empty values and are reported
/// by validation, which returns every violation at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentRequest {
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "float_or_zero"
    )]
    pub amount: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub payment_currency: String,
    pub originator: Option<ContactRequest>,
    pub beneficiary: Option<ContactRequest>,

    /// `None` means "not provided"; every variant is a real choice.
    pub charges_bearer: Option<ChargesBearer>,
    #[serde(deserialize_with = "null_as_default")]
    pub details: String,
    pub reference_number: Option<String>,
}

/// JSON number, or zero when `null`. Zero is reported as a missing amount.
fn float_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::float_option::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A validated payment request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub amount: Decimal,
    pub payment_currency: String,
    pub originator: NewContact,
    pub beneficiary: NewContact,
    pub charges_bearer: ChargesBearer,
    pub details: String,
    pub reference_number: Option<String>,
}

/// Payment row to insert, referencing already resolved contacts.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub amount: Decimal,
    pub payment_currency: String,
    pub originator_id: i64,
    pub beneficiary_id: i64,
    pub charges_bearer: ChargesBearer,
    pub details: String,
    pub reference_number: Option<String>,
}

impl PaymentRecord {
    /// Build the row for `payment` between the two resolved contacts.
    pub fn new(payment: NewPayment, originator_id: i64, beneficiary_id: i64) -> Self {
        Self {
            amount: payment.amount,
            payment_currency: payment.payment_currency,
            originator_id,
            beneficiary_id,
            charges_bearer: payment.charges_bearer,
            details: payment.details,
            reference_number: payment.reference_number,
        }
    }
}
