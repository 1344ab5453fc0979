//! Contact HTTP handlers.
//!
//! - POST /contact - Create a contact (always inserts, no name lookup)
//! - GET /contact - List all contacts
//! - GET /contact/{id} - Get contact by ID

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    models::contact::{Contact, ContactRequest},
    services::contact_service,
};

/// Create a new contact.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Test Three",
///   "address": { "addressLine1": "Test Three Str", "countryCode": "CY" },
///   "account": { "accountNumber": "ASD44444", "bic": "BCYO12312" }
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the stored contact, `Location: /contact/{id}`
/// - **400 Bad Request**: validation failures
/// - **400 Bad Request**: `invalid_body` when the JSON itself is malformed
pub async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body?;
    let contact = contact_service::create_contact(state.db.as_ref(), request).await?;
    let location = format!("/contact/{}", contact.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(contact),
    ))
}

/// List all contacts with their address and bank account.
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, AppError> {
    let contacts = contact_service::list_contacts(state.db.as_ref()).await?;

    Ok(Json(contacts))
}

/// Get a specific contact by ID.
pub async fn get_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<i64>,
) -> Result<Json<Contact>, AppError> {
    let contact = contact_service::get_contact(state.db.as_ref(), contact_id).await?;

    Ok(Json(contact))
}
