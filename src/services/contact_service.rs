//! Contact service - direct contact management.
//!
//! Unlike payment creation, `create_contact` never looks up existing
//! contacts by name: it always inserts.

use crate::{
    error::AppError,
    models::contact::{Contact, ContactRequest},
    store::Database,
    validation::Validate,
};

/// Validate and insert a contact with its address and bank account.
///
/// # Errors
///
/// - `Validation`: name, address or account fields are missing
/// - `Storage`: the insert failed and was rolled back
#[tracing::instrument(skip_all)]
pub async fn create_contact(db: &dyn Database, request: ContactRequest) -> Result<Contact, AppError> {
    let contact = request.validated().map_err(AppError::Validation)?;

    let mut uow = db.begin().await?;
    let created = match uow.add_contact(contact).await {
        Ok(created) => created,
        Err(err) => {
            tracing::error!(error = %err, "storing contact failed, rolling back");
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            return Err(err.into());
        }
    };
    uow.commit().await?;

    tracing::info!(contact_id = created.id, "contact created");
    Ok(created)
}

/// Get contact by ID.
pub async fn get_contact(db: &dyn Database, id: i64) -> Result<Contact, AppError> {
    let mut uow = db.begin().await?;
    let contact = uow.find_contact(id).await?;
    uow.commit().await?;

    contact.ok_or(AppError::NotFound)
}

/// List every contact, ordered by id.
pub async fn list_contacts(db: &dyn Database) -> Result<Vec<Contact>, AppError> {
    let mut uow = db.begin().await?;
    let contacts = uow.list_contacts().await?;
    uow.commit().await?;

    Ok(contacts)
}
