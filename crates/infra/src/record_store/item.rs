//! Storage row layout for shipment records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{OrderId, ShippingId};
use storefront_shipping::{RecordStoreError, ShippingRecord, ShippingStatus, ShippingType};

/// Separator used to flatten `product_ids` into one attribute.
pub const PRODUCT_ID_SEPARATOR: char = ',';

/// Escapes a literal separator (or itself) inside a product id.
pub const PRODUCT_ID_ESCAPE: char = '\\';

/// One row of the shipping table.
///
/// Every attribute is stored as a string: product ids comma-joined (commas and
/// backslashes inside an id are backslash-escaped), status in
/// its lowercase stored form, dates as RFC 3339 UTC (which sorts
/// lexicographically).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingItem {
    pub shipping_id: String,
    pub order_id: String,
    pub shipping_type: String,
    pub product_ids: String,
    pub shipping_status: String,
    pub created_date: String,
    pub due_date: String,
}

impl ShippingItem {
    pub fn from_record(record: &ShippingRecord) -> Self {
        Self {
            shipping_id: record.shipping_id.to_string(),
            order_id: record.order_id.to_string(),
            shipping_type: record.shipping_type.as_str().to_string(),
            product_ids: join_product_ids(&record.product_ids),
            shipping_status: record.shipping_status.as_str().to_string(),
            created_date: format_timestamp(record.created_date),
            due_date: format_timestamp(record.due_date),
        }
    }

    /// Decode the row back into a typed record.
    pub fn to_record(&self) -> Result<ShippingRecord, RecordStoreError> {
        let corrupt = |field: &str, err: &dyn core::fmt::Display| {
            RecordStoreError::Corrupt(format!(
                "shipping {}: bad {field}: {err}",
                self.shipping_id
            ))
        };

        Ok(ShippingRecord {
            shipping_id: ShippingId::new(self.shipping_id.as_str())
                .map_err(|e| corrupt("shipping_id", &e))?,
            order_id: OrderId::new(self.order_id.as_str()).map_err(|e| corrupt("order_id", &e))?,
            shipping_type: self
                .shipping_type
                .parse::<ShippingType>()
                .map_err(|e| corrupt("shipping_type", &e))?,
            product_ids: split_product_ids(&self.product_ids),
            shipping_status: self
                .shipping_status
                .parse::<ShippingStatus>()
                .map_err(|e| corrupt("shipping_status", &e))?,
            created_date: parse_timestamp(&self.created_date)
                .map_err(|e| corrupt("created_date", &e))?,
            due_date: parse_timestamp(&self.due_date).map_err(|e| corrupt("due_date", &e))?,
        })
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

fn join_product_ids(ids: &[String]) -> String {
    let mut joined = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            joined.push(PRODUCT_ID_SEPARATOR);
        }
        for c in id.chars() {
            if c == PRODUCT_ID_SEPARATOR || c == PRODUCT_ID_ESCAPE {
                joined.push(PRODUCT_ID_ESCAPE);
            }
            joined.push(c);
        }
    }
    joined
}

fn split_product_ids(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut ids = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            PRODUCT_ID_ESCAPE => current.extend(chars.next()),
            PRODUCT_ID_SEPARATOR => ids.push(core::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    ids.push(current);
    ids
}
