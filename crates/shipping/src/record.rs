use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{OrderId, ShippingId};

use crate::shipping_type::ShippingType;
use crate::status::ShippingStatus;

/// A shipment as read back from the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRecord {
    pub shipping_id: ShippingId,
    pub order_id: OrderId,
    pub shipping_type: ShippingType,
    /// Product names in the order they were committed.
    pub product_ids: Vec<String>,
    pub shipping_status: ShippingStatus,
    pub created_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl ShippingRecord {
    /// A shipment is late once `now` has passed its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now
    }
}

/// Acknowledgment returned by the record store for a status write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub shipping_id: ShippingId,
    pub status: ShippingStatus,
    pub written_at: DateTime<Utc>,
}
