//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Calls the matching service function
//! 3. Returns HTTP response (JSON, status code)

/// Contact endpoints
pub mod contacts;
/// Service health endpoint
pub mod health;
/// Payment endpoints
pub mod payments;
