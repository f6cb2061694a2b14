//! Queue boundary used to signal pending shipment resolution.

use std::sync::Arc;

use thiserror::Error;

use storefront_core::{MessageId, ShippingId};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,

    #[error("queue transport error: {0}")]
    Transport(String),
}

/// At-least-once message queue carrying shipping identifiers.
///
/// - `poll_shipping` waits for a bounded time and may return fewer ids than
///   requested (including none).
/// - The same id may be delivered more than once; consumers must be idempotent.
pub trait ShippingQueue: Send + Sync {
    fn send_new_shipping(&self, shipping_id: &ShippingId) -> Result<MessageId, QueueError>;

    fn poll_shipping(&self, batch_size: usize) -> Result<Vec<ShippingId>, QueueError>;
}

impl<Q> ShippingQueue for Arc<Q>
where
    Q: ShippingQueue + ?Sized,
{
    fn send_new_shipping(&self, shipping_id: &ShippingId) -> Result<MessageId, QueueError> {
        (**self).send_new_shipping(shipping_id)
    }

    fn poll_shipping(&self, batch_size: usize) -> Result<Vec<ShippingId>, QueueError> {
        (**self).poll_shipping(batch_size)
    }
}
