use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};

use storefront_core::{DomainError, OrderId, ShippingId};
use storefront_shipping::{ShippingBackend, ShippingError};

use crate::cart::ShoppingCart;

/// Grace window applied when `place_order` is called without a due date.
///
/// Meant for demos and tests; real callers pass an explicit deadline.
pub const DEFAULT_DUE_GRACE_SECS: i64 = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Cart or order state rejected the placement.
    #[error(transparent)]
    Cart(#[from] DomainError),

    /// The shipping backend rejected or failed the request.
    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

impl OrderError {
    pub fn is_validation(&self) -> bool {
        match self {
            OrderError::Cart(e) => e.is_validation(),
            OrderError::Shipping(e) => e.is_validation(),
        }
    }
}

/// An order: a cart bound to a shipping backend under a unique id.
///
/// Purchased product names accumulate across `place_order` attempts: if the
/// cart commit stops partway, the lines already bought are remembered and a
/// retry commits only the rest. If shipment creation fails after a full commit
/// (store or queue outage), the next call only retries the shipment request.
#[derive(Debug)]
pub struct Order<B> {
    order_id: OrderId,
    cart: ShoppingCart,
    shipping_service: B,
    purchased: Vec<String>,
    cart_submitted: bool,
    shipping_id: Option<ShippingId>,
}

impl<B: ShippingBackend> Order<B> {
    /// New order with a freshly generated id.
    pub fn new(cart: ShoppingCart, shipping_service: B) -> Self {
        Self::with_id(OrderId::generate(), cart, shipping_service)
    }

    pub fn with_id(order_id: OrderId, cart: ShoppingCart, shipping_service: B) -> Self {
        Self {
            order_id,
            cart,
            shipping_service,
            purchased: Vec::new(),
            cart_submitted: false,
            shipping_id: None,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn cart(&self) -> &ShoppingCart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut ShoppingCart {
        &mut self.cart
    }

    /// Product names bought so far, in commit order.
    pub fn committed_products(&self) -> &[String] {
        &self.purchased
    }

    pub fn is_cart_submitted(&self) -> bool {
        self.cart_submitted
    }

    pub fn shipping_id(&self) -> Option<&ShippingId> {
        self.shipping_id.as_ref()
    }

    pub fn is_placed(&self) -> bool {
        self.shipping_id.is_some()
    }

    /// Commit the cart and request a shipment; returns the new shipping id.
    ///
    /// Validation failures (unknown carrier, past deadline) leave the cart
    /// untouched. `due_date` defaults to now + [`DEFAULT_DUE_GRACE_SECS`].
    pub fn place_order(
        &mut self,
        shipping_type: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<ShippingId, OrderError> {
        if let Some(existing) = &self.shipping_id {
            return Err(DomainError::invariant(format!(
                "order {} already placed as shipping {existing}",
                self.order_id
            ))
            .into());
        }

        let due_date =
            due_date.unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_DUE_GRACE_SECS));

        self.shipping_service
            .validate_shipping(shipping_type, due_date)?;

        if !self.cart_submitted {
            self.cart.submit_into(&mut self.purchased)?;
            self.cart_submitted = true;
            debug!(order_id = %self.order_id, products = self.purchased.len(), "cart committed");
        }

        let shipping_id = self.shipping_service.create_shipping(
            shipping_type,
            &self.purchased,
            &self.order_id,
            due_date,
        )?;

        info!(order_id = %self.order_id, shipping_id = %shipping_id, "order placed");
        self.shipping_id = Some(shipping_id.clone());
        Ok(shipping_id)
    }
}
