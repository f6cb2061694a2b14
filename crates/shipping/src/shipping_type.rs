use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, ValueObject};

/// Supported carriers. The list doubles as the validation whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShippingType {
    #[serde(rename = "Нова Пошта")]
    NovaPoshta,
    #[serde(rename = "Укр Пошта")]
    UkrPoshta,
    #[serde(rename = "Meest Express")]
    MeestExpress,
}

impl ShippingType {
    pub const ALL: [ShippingType; 3] = [
        ShippingType::NovaPoshta,
        ShippingType::UkrPoshta,
        ShippingType::MeestExpress,
    ];

    /// Carrier display name, also the stored form.
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingType::NovaPoshta => "Нова Пошта",
            ShippingType::UkrPoshta => "Укр Пошта",
            ShippingType::MeestExpress => "Meest Express",
        }
    }
}

impl ValueObject for ShippingType {}

impl core::fmt::Display for ShippingType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation("Shipping type is not available"))
    }
}
