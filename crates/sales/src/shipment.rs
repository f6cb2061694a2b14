use storefront_core::ShippingId;
use storefront_shipping::{ShippingBackend, ShippingError, ShippingStatus};

/// Read-side handle to one shipment.
#[derive(Debug, Clone)]
pub struct Shipment<B> {
    shipping_id: ShippingId,
    shipping_service: B,
}

impl<B: ShippingBackend> Shipment<B> {
    pub fn new(shipping_id: ShippingId, shipping_service: B) -> Self {
        Self {
            shipping_id,
            shipping_service,
        }
    }

    pub fn shipping_id(&self) -> &ShippingId {
        &self.shipping_id
    }

    /// Fresh status from the backend; never cached.
    pub fn check_shipping_status(&self) -> Result<ShippingStatus, ShippingError> {
        self.shipping_service.check_status(&self.shipping_id)
    }
}
