use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use storefront_core::{Clock, OrderId, ShippingId, SystemClock};
use storefront_shipping::{
    RecordStoreError, ShippingRecord, ShippingRecordStore, ShippingStatus, ShippingType, WriteAck,
};

use super::item::ShippingItem;

/// Default table name when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "shipping";

/// In-memory shipping table.
///
/// Rows are kept in their stored string form and decoded on every read, so the
/// same conversion rules apply as for a real table. Intended for tests/dev.
pub struct InMemoryShippingStore {
    table_name: String,
    items: RwLock<HashMap<String, ShippingItem>>,
    clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for InMemoryShippingStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryShippingStore")
            .field("table_name", &self.table_name)
            .field("rows", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryShippingStore {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_NAME)
    }
}

impl InMemoryShippingStore {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            items: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn arc(table_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(table_name))
    }

    /// Stamp `created_date` and acknowledgments from `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Number of rows; 0 if the table lock is poisoned.
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw stored row, as a table scan would return it.
    pub fn raw_item(&self, shipping_id: &ShippingId) -> Result<Option<ShippingItem>, RecordStoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(shipping_id.as_str()).cloned())
    }

    /// Overwrite a raw row. Lets tests plant rows that fail to decode.
    pub fn put_raw_item(&self, item: ShippingItem) -> Result<(), RecordStoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.insert(item.shipping_id.clone(), item);
        Ok(())
    }
}

fn poisoned() -> RecordStoreError {
    RecordStoreError::Storage("lock poisoned".to_string())
}

impl ShippingRecordStore for InMemoryShippingStore {
    #[instrument(
        skip(self, product_ids, order_id),
        fields(table = %self.table_name, order_id = %order_id),
        err
    )]
    fn create_shipping(
        &self,
        shipping_type: ShippingType,
        product_ids: &[String],
        order_id: &OrderId,
        status: ShippingStatus,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, RecordStoreError> {
        let shipping_id = ShippingId::generate();
        let record = ShippingRecord {
            shipping_id: shipping_id.clone(),
            order_id: order_id.clone(),
            shipping_type,
            product_ids: product_ids.to_vec(),
            shipping_status: status,
            created_date: self.clock.now(),
            due_date,
        };

        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.insert(shipping_id.to_string(), ShippingItem::from_record(&record));
        debug!(shipping_id = %shipping_id, "shipping row written");

        Ok(shipping_id)
    }

    fn get_shipping(
        &self,
        shipping_id: &ShippingId,
    ) -> Result<Option<ShippingRecord>, RecordStoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        items
            .get(shipping_id.as_str())
            .map(ShippingItem::to_record)
            .transpose()
    }

    #[instrument(skip(self, shipping_id), fields(table = %self.table_name, shipping_id = %shipping_id), err)]
    fn update_shipping_status(
        &self,
        shipping_id: &ShippingId,
        status: ShippingStatus,
    ) -> Result<WriteAck, RecordStoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let item = items
            .get_mut(shipping_id.as_str())
            .ok_or_else(|| RecordStoreError::NotFound(shipping_id.clone()))?;

        item.shipping_status = status.as_str().to_string();
        debug!(status = %status, "shipping status written");

        Ok(WriteAck {
            shipping_id: shipping_id.clone(),
            status,
            written_at: self.clock.now(),
        })
    }
}
