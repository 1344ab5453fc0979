//! Data models representing stored entities and request bodies.

/// Contacts with their address and bank account
pub mod contact;
/// List query parameters and the parsed payment filter
pub mod filter;
/// Payments and charges bearer
pub mod payment;

use serde::{Deserialize, Deserializer};

/// Deserialize a request field, reading JSON `null` as the type's default.
///
/// Lets validation report `"name": null` the same way as `"name": ""`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
