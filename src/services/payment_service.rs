//! Payment service - create-payment workflow and payment reads.
//!
//! Creating a payment:
//! 1. Validate the request (no storage touched when invalid)
//! 2. Open a unit of work and lock both party names
//! 3. Resolve the beneficiary, then the originator, by name
//! 4. Insert the payment
//! 5. Commit, or roll everything back on any storage failure
//!
//! # Contact Resolution
//!
//! A party whose name matches an existing contact reuses that contact and
//! overwrites its address with the request's address. The stored bank
//! account is kept as is. Unknown names create a new contact.

use crate::{
    error::AppError,
    models::{
        contact::{Contact, NewContact},
        filter::PaymentFilter,
        payment::{NewPayment, Payment, PaymentRecord, PaymentRequest},
    },
    store::{Database, StorageError, UnitOfWork},
    validation::Validate,
};

/// Create a payment, resolving its parties to contacts.
///
/// # Returns
///
/// The stored payment with generated ids for the payment and for any
/// contact created on the way.
///
/// # Errors
///
/// - `Validation`: the request is incomplete; nothing was written
/// - `Storage`: any store failure; the unit of work was rolled back
#[tracing::instrument(skip_all)]
pub async fn create_payment(db: &dyn Database, request: PaymentRequest) -> Result<Payment, AppError> {
    let payment = request.validated().map_err(|result| {
        tracing::debug!(fields = ?result.errors.keys().collect::<Vec<_>>(), "payment rejected");
        AppError::Validation(result)
    })?;

    let mut uow = db.begin().await?;

    let result = async {
        let created = store_payment(uow.as_mut(), payment).await?;
        uow.commit().await?;
        Ok::<_, StorageError>(created)
    }
    .await;

    match result {
        Ok(created) => {
            tracing::info!(
                payment_id = created.id,
                originator_id = created.originator_id,
                beneficiary_id = created.beneficiary_id,
                "payment created"
            );
            Ok(created)
        }
        Err(err) => {
            tracing::error!(error = %err, "storing payment failed, rolling back");
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(AppError::Storage(err))
        }
    }
}

/// Steps 2-4 of the workflow, inside an open unit of work.
async fn store_payment(uow: &mut dyn UnitOfWork, payment: NewPayment) -> Result<Payment, StorageError> {
    // Lock in a fixed order so two payments naming the same parties in
    // opposite roles cannot deadlock.
    let mut names = vec![
        payment.beneficiary.name.clone(),
        payment.originator.name.clone(),
    ];
    names.sort();
    names.dedup();
    for name in &names {
        uow.lock_contact_name(name).await?;
    }

    let beneficiary = resolve_contact(uow, &payment.beneficiary).await?;
    let originator = resolve_contact(uow, &payment.originator).await?;

    uow.add_payment(PaymentRecord::new(payment, originator.id, beneficiary.id))
        .await
}

/// Find the contact named like `requested` and refresh its address, or
/// create it.
async fn resolve_contact(
    uow: &mut dyn UnitOfWork,
    requested: &NewContact,
) -> Result<Contact, StorageError> {
    match uow.find_contact_by_name(&requested.name).await? {
        Some(mut existing) => {
            tracing::debug!(contact_id = existing.id, "updating address of existing contact");
            existing.address.apply(&requested.address);
            uow.update_contact(&existing).await
        }
        None => {
            let created = uow.add_contact(requested.clone()).await?;
            tracing::debug!(contact_id = created.id, "created contact");
            Ok(created)
        }
    }
}

/// Get payment by ID.
///
/// # Errors
///
/// - `NotFound`: no payment has this id
pub async fn get_payment(db: &dyn Database, id: i64) -> Result<Payment, AppError> {
    let mut uow = db.begin().await?;
    let payment = uow.find_payment(id).await?;
    uow.commit().await?;

    payment.ok_or(AppError::NotFound)
}

/// List payments matching `filter`, in no particular order.
pub async fn list_payments(db: &dyn Database, filter: &PaymentFilter) -> Result<Vec<Payment>, AppError> {
    let mut uow = db.begin().await?;
    let payments = uow.query_payments(filter).await?;
    uow.commit().await?;

    Ok(payments)
}
