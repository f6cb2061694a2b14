use tracing::debug;

use storefront_core::{DomainError, DomainResult};
use storefront_products::{ProductName, SharedProduct};

/// Cart line: product and requested quantity (always ≥ 1).
#[derive(Debug, Clone)]
pub struct CartLine {
    product: SharedProduct,
    quantity: i64,
}

impl CartLine {
    pub fn product(&self) -> &SharedProduct {
        &self.product
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// In-memory shopping cart.
///
/// Adding a product reserves its quantity on the product, so stock checked at
/// add time is still there at submit time. Lines keep insertion order; adding
/// the same product again replaces its quantity in place. Reservations held by
/// a cart that is dropped without being submitted are released.
#[derive(Debug, Default)]
pub struct ShoppingCart {
    lines: Vec<CartLine>,
}

impl ShoppingCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn contains_product(&self, product: &SharedProduct) -> bool {
        self.position(product.name()).is_some()
    }

    pub fn quantity_of(&self, name: &ProductName) -> Option<i64> {
        self.position(name).map(|idx| self.lines[idx].quantity)
    }

    /// Sum of `price × quantity` over all lines, in smallest currency unit.
    ///
    /// Fails with a validation error if the total does not fit in a `u64`.
    pub fn calculate_total(&self) -> DomainResult<u64> {
        self.lines.iter().try_fold(0u64, |total, line| {
            u64::try_from(line.quantity)
                .ok()
                .and_then(|quantity| line.product.price().checked_mul(quantity))
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| DomainError::validation("cart total overflows"))
        })
    }

    /// Put `amount` units of `product` in the cart, replacing any previous quantity.
    ///
    /// Products are identified by name: if the cart already holds a line with
    /// this name, stock is checked and reserved on that line's product, even when
    /// `product` is a different handle.
    pub fn add_product(&mut self, product: &SharedProduct, amount: i64) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::validation("Amount must be positive"));
        }

        let idx = self.position(product.name());
        let (stock, held) = match idx {
            Some(i) => (&self.lines[i].product, self.lines[i].quantity),
            None => (product, 0),
        };

        stock.with(|p| {
            // What this cart already holds counts as available to it.
            p.release(held);
            if !p.is_available(amount)? {
                let available = p.unreserved_amount();
                p.reserve(held)?;
                return Err(DomainError::insufficient_stock(
                    p.name().as_str(),
                    amount,
                    available,
                ));
            }
            p.reserve(amount)
        })?;

        match idx {
            Some(i) => self.lines[i].quantity = amount,
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: amount,
            }),
        }
        Ok(())
    }

    /// Drop `product` from the cart and release its reservation. No-op if absent.
    pub fn remove_product(&mut self, product: &SharedProduct) {
        if let Some(idx) = self.position(product.name()) {
            let line = self.lines.remove(idx);
            line.product.with(|p| p.release(line.quantity));
        }
    }

    /// Buy every line in insertion order and return the purchased product names.
    ///
    /// Committed lines leave the cart as they are bought. If a line fails, the
    /// lines before it stay bought (no rollback) and that line and the rest stay
    /// in the cart with their reservations.
    pub fn submit_cart_order(&mut self) -> DomainResult<Vec<String>> {
        let mut product_ids = Vec::with_capacity(self.lines.len());
        self.submit_into(&mut product_ids)?;
        Ok(product_ids)
    }

    /// Like [`submit_cart_order`](Self::submit_cart_order), appending names to
    /// `purchased` as lines are bought. On failure `purchased` still holds every
    /// line committed before the failing one.
    pub fn submit_into(&mut self, purchased: &mut Vec<String>) -> DomainResult<()> {
        let mut committed = 0;

        let result: DomainResult<()> = self.lines.iter().try_for_each(|line| {
            line.product.with(|p| p.commit_reserved(line.quantity))?;
            purchased.push(line.product.name().to_string());
            committed += 1;
            Ok(())
        });

        self.lines.drain(..committed);
        debug!(committed, remaining = self.lines.len(), "cart submitted");

        result
    }

    fn position(&self, name: &ProductName) -> Option<usize> {
        self.lines.iter().position(|line| line.product.name() == name)
    }
}

impl Drop for ShoppingCart {
    fn drop(&mut self) {
        for line in self.lines.drain(..) {
            line.product.with(|p| p.release(line.quantity));
        }
    }
}
