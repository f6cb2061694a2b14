/// Tunables for `ShippingService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingSettings {
    /// Maximum ids drained from the queue per `process_shipping_batch` call.
    pub batch_size: usize,
}

impl ShippingSettings {
    pub const DEFAULT_BATCH_SIZE: usize = 10;

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}
