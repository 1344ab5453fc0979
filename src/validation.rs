//! Request validation.
//!
//! Every request type implements [`Validate`]. Validation is pure: it only
//! inspects the request and collects every violation into a
//! [`ValidationResult`] keyed by the JSON path of the offending field
//! (`originator.address.countryCode`).
//!
//! A valid request is turned into its typed counterpart with
//! [`Validate::validated`], so nothing downstream handles optional
//! "required" fields.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{
    contact::{AddressRequest, BankAccountRequest, ContactRequest, NewContact},
    payment::{NewPayment, PaymentRequest},
};

/// Field path to error messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Outcome of validating a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: FieldErrors,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add(&mut self, prefix: &str, field: &str, message: &str) {
        self.errors
            .entry(join_path(prefix, field))
            .or_default()
            .push(message.to_string());
    }

    fn require(&mut self, prefix: &str, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(prefix, field, message);
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Field-level validation of a request type.
pub trait Validate: Sized {
    /// Validated form of the request.
    type Output;

    /// Append the violations of `self` to `result`, with field paths
    /// relative to `prefix` (empty at the top level).
    fn validate_into(&self, prefix: &str, result: &mut ValidationResult);

    /// Convert an already validated request.
    ///
    /// Only called after `validate_into` reported nothing.
    fn into_valid(self) -> Option<Self::Output>;

    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        self.validate_into("", &mut result);
        result
    }

    /// Validate and convert in one step.
    fn validated(self) -> Result<Self::Output, ValidationResult> {
        let result = self.validate();
        if !result.is_valid() {
            return Err(result);
        }
        self.into_valid().ok_or(result)
    }
}

impl Validate for AddressRequest {
    type Output = crate::models::contact::NewAddress;

    fn validate_into(&self, prefix: &str, result: &mut ValidationResult) {
        result.require(
            prefix,
            "addressLine1",
            &self.address_line1,
            "Address Line 1 is required",
        );
        result.require(
            prefix,
            "countryCode",
            &self.country_code,
            "Country Code is required",
        );
    }

    fn into_valid(self) -> Option<Self::Output> {
        Some(self.into())
    }
}

impl Validate for BankAccountRequest {
    type Output = crate::models::contact::NewBankAccount;

    fn validate_into(&self, prefix: &str, result: &mut ValidationResult) {
        result.require(
            prefix,
            "accountNumber",
            &self.account_number,
            "Account Number is required",
        );
        result.require(prefix, "bic", &self.bic, "Bic is required");
    }

    fn into_valid(self) -> Option<Self::Output> {
        Some(self.into())
    }
}

impl Validate for ContactRequest {
    type Output = NewContact;

    fn validate_into(&self, prefix: &str, result: &mut ValidationResult) {
        result.require(prefix, "name", &self.name, "Name is required");

        match &self.address {
            Some(address) => address.validate_into(&join_path(prefix, "address"), result),
            None => result.add(prefix, "address", "Address is required"),
        }

        match &self.account {
            Some(account) => account.validate_into(&join_path(prefix, "account"), result),
            None => result.add(prefix, "account", "Account is required"),
        }
    }

    fn into_valid(self) -> Option<Self::Output> {
        Some(NewContact {
            name: self.name,
            address: self.address?.into_valid()?,
            account: self.account?.into_valid()?,
        })
    }
}

impl Validate for PaymentRequest {
    type Output = NewPayment;

    fn validate_into(&self, prefix: &str, result: &mut ValidationResult) {
        if self.amount.is_zero() {
            result.add(prefix, "amount", "Amount is required");
        }

        result.require(
            prefix,
            "paymentCurrency",
            &self.payment_currency,
            "Payment Currency is required",
        );

        if self.charges_bearer.is_none() {
            result.add(prefix, "chargesBearer", "Charges Bearer is required");
        }

        result.require(prefix, "details", &self.details, "Details is required");

        match &self.originator {
            Some(originator) => originator.validate_into(&join_path(prefix, "originator"), result),
            None => result.add(prefix, "originator", "Originator is required"),
        }

        match &self.beneficiary {
            Some(beneficiary) => {
                beneficiary.validate_into(&join_path(prefix, "beneficiary"), result)
            }
            None => result.add(prefix, "beneficiary", "Beneficiary is required"),
        }
    }

    fn into_valid(self) -> Option<Self::Output> {
        Some(NewPayment {
            amount: self.amount,
            payment_currency: self.payment_currency,
            originator: self.originator?.into_valid()?,
            beneficiary: self.beneficiary?.into_valid()?,
            charges_bearer: self.charges_bearer?,
            details: self.details,
            reference_number: self.reference_number,
        })
    }
}
