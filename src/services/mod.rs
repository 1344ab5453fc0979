//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate requests, open a unit of work on the store and commit or
//! roll it back.

pub mod contact_service;
pub mod payment_service;
