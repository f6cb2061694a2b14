//! Strongly-typed identifiers used across the domain.
//!
//! Order and shipping identifiers are opaque strings: callers may supply their
//! own (e.g. `"order_1"`), and generated ones are UUIDv7 text.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of an order. Must be unique per order for shipment correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

/// Identifier of a shipment record, assigned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingId(String);

/// Identifier of a message accepted by the shipping queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Generate a fresh identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Wrap a caller-supplied identifier. Blank values are rejected.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{} cannot be empty", $name)));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_id!(OrderId, "OrderId");
impl_string_id!(ShippingId, "ShippingId");
impl_string_id!(MessageId, "MessageId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
        assert_ne!(ShippingId::generate(), ShippingId::generate());
    }

    #[test]
    fn caller_supplied_ids_round_trip_through_display() {
        let id: OrderId = "order_i2hur2937r9".parse().unwrap();
        assert_eq!(id.to_string(), "order_i2hur2937r9");
        assert_eq!(id.as_str(), "order_i2hur2937r9");
    }

    #[test]
    fn blank_ids_are_rejected() {
        let err = ShippingId::new("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }
}
