//! Payment HTTP handlers.
//!
//! This module implements payment-related API endpoints:
//! - POST /payment - Create a payment, resolving its parties by name
//! - GET /payment - List payments, optionally filtered
//! - GET /payment/{id} - Get payment details

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    models::{
        filter::{PaymentFilter, PaymentQuery},
        payment::{Payment, PaymentRequest},
    },
    services::payment_service,
};

/// Create a payment.
///
/// # Request Body
///
/// ```json
/// {
///   "amount": 388.50,
///   "paymentCurrency": "EUR",
///   "originator": { "name": "Test One", "address": { ... }, "account": { ... } },
///   "beneficiary": { "name": "Test Two", "address": { ... }, "account": { ... } },
///   "chargesBearer": "Beneficiary",
///   "details": "This is a necessary payment"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the stored payment, `Location: /payment/{id}`
/// - **400 Bad Request**: field → messages map of validation failures
/// - **400 Bad Request**: `invalid_body` when the JSON itself is malformed
/// - **502 Bad Gateway**: storage failed; nothing was written
pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body?;
    let payment = payment_service::create_payment(state.db.as_ref(), request).await?;
    let location = format!("/payment/{}", payment.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(payment),
    ))
}

/// List payments.
///
/// # Query Parameters
///
/// - `id`: comma-separated ids, e.g. `?id=1,2`
/// - `from`, `to`: creation time bounds, e.g. `?from=2024-05-22`
/// - `minAmount`, `maxAmount`: amount bounds, e.g. `?maxAmount=390.00`
///
/// # Response
///
/// - **200 OK**: array of payments with both contacts (may be empty)
/// - **400 Bad Request**: a filter value is malformed
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let filter = PaymentFilter::try_from(query)?;
    let payments = payment_service::list_payments(state.db.as_ref(), &filter).await?;

    Ok(Json(payments))
}

/// Get payment by ID.
///
/// Returns 404 with an empty body when the payment does not exist.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> Result<Json<Payment>, AppError> {
    let payment = payment_service::get_payment(state.db.as_ref(), payment_id).await?;

    Ok(Json(payment))
}
