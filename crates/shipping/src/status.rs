use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Shipment status lifecycle.
///
/// `Created → InProgress → (Completed | Failed)`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShippingStatus {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

impl ShippingStatus {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingStatus::Created => "created",
            ShippingStatus::InProgress => "in progress",
            ShippingStatus::Completed => "completed",
            ShippingStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShippingStatus::Completed | ShippingStatus::Failed)
    }

    pub fn can_transition_to(self, next: ShippingStatus) -> bool {
        use ShippingStatus::*;
        matches!(
            (self, next),
            (Created, InProgress) | (Created | InProgress, Completed | Failed)
        )
    }
}

impl core::fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ShippingStatus::Created),
            "in progress" => Ok(ShippingStatus::InProgress),
            "completed" => Ok(ShippingStatus::Completed),
            "failed" => Ok(ShippingStatus::Failed),
            other => Err(DomainError::validation(format!(
                "unknown shipping status '{other}'"
            ))),
        }
    }
}
