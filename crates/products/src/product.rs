use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, ValueObject};

/// Product identity key.
///
/// Products are identified by name only: two records with the same name denote
/// the same inventory line regardless of price or stock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for ProductName {}

impl core::fmt::Display for ProductName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog line item backed by its own stock counter.
///
/// Stock is split into `available_amount` (units on hand) and
/// `reserved_amount` (units held by carts that have not been submitted yet).
/// Only the unreserved remainder can be bought or reserved again.
#[derive(Debug, Clone)]
pub struct Product {
    name: ProductName,
    /// Price in smallest currency unit (e.g., cents).
    price: u64,
    available_amount: i64,
    reserved_amount: i64,
}

impl Product {
    pub fn new(name: impl Into<String>, price: u64, available_amount: i64) -> DomainResult<Self> {
        let name = ProductName::new(name)?;
        if available_amount < 0 {
            return Err(DomainError::validation(
                "available_amount must be a non-negative integer",
            ));
        }
        Ok(Self {
            name,
            price,
            available_amount,
            reserved_amount: 0,
        })
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    /// Units on hand, including units reserved by open carts.
    pub fn available_amount(&self) -> i64 {
        self.available_amount
    }

    pub fn reserved_amount(&self) -> i64 {
        self.reserved_amount
    }

    /// Units that can still be bought or reserved.
    pub fn unreserved_amount(&self) -> i64 {
        self.available_amount - self.reserved_amount
    }

    /// Whether `requested` units can be taken right now.
    pub fn is_available(&self, requested: i64) -> DomainResult<bool> {
        ensure_quantity(requested, "requested_amount")?;
        Ok(self.unreserved_amount() >= requested)
    }

    /// Take `requested` units out of stock. Nothing changes on failure.
    pub fn buy(&mut self, requested: i64) -> DomainResult<()> {
        ensure_quantity(requested, "requested_amount")?;
        let free = self.unreserved_amount();
        if free < requested {
            return Err(DomainError::insufficient_stock(
                self.name.as_str(),
                requested,
                free,
            ));
        }
        self.available_amount -= requested;
        Ok(())
    }

    /// Hold `amount` units for a cart.
    pub fn reserve(&mut self, amount: i64) -> DomainResult<()> {
        ensure_quantity(amount, "amount")?;
        let free = self.unreserved_amount();
        if free < amount {
            return Err(DomainError::insufficient_stock(
                self.name.as_str(),
                amount,
                free,
            ));
        }
        self.reserved_amount += amount;
        Ok(())
    }

    /// Return previously reserved units. Releasing more than is held clamps to zero.
    pub fn release(&mut self, amount: i64) {
        self.reserved_amount = (self.reserved_amount - amount.max(0)).max(0);
    }

    /// Turn a reservation into a purchase.
    pub fn commit_reserved(&mut self, amount: i64) -> DomainResult<()> {
        ensure_quantity(amount, "amount")?;
        if amount > self.reserved_amount {
            return Err(DomainError::invariant(format!(
                "cannot commit {amount} units of {}: only {} reserved",
                self.name, self.reserved_amount
            )));
        }
        if amount > self.available_amount {
            return Err(DomainError::insufficient_stock(
                self.name.as_str(),
                amount,
                self.available_amount,
            ));
        }
        self.available_amount -= amount;
        self.reserved_amount -= amount;
        Ok(())
    }

    /// Put units back on the shelf.
    pub fn restock(&mut self, amount: i64) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::validation("restock amount must be positive"));
        }
        self.available_amount = self
            .available_amount
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("restock would overflow available_amount"))?;
        Ok(())
    }
}

fn ensure_quantity(value: i64, field: &str) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!(
            "{field} must be a non-negative integer"
        )));
    }
    Ok(())
}

impl Entity for Product {
    type Id = ProductName;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Product {}

impl core::hash::Hash for Product {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.name, f)
    }
}

/// A product shared between the catalog and the carts holding it.
///
/// Every stock mutation goes through one mutex per product, so the
/// reserve-then-commit path never races with another cart.
#[derive(Debug, Clone)]
pub struct SharedProduct {
    name: ProductName,
    inner: Arc<Mutex<Product>>,
}

impl SharedProduct {
    pub fn new(product: Product) -> Self {
        Self {
            name: product.name.clone(),
            inner: Arc::new(Mutex::new(product)),
        }
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.lock().price()
    }

    pub fn available_amount(&self) -> i64 {
        self.lock().available_amount()
    }

    pub fn reserved_amount(&self) -> i64 {
        self.lock().reserved_amount()
    }

    pub fn is_available(&self, requested: i64) -> DomainResult<bool> {
        self.lock().is_available(requested)
    }

    pub fn buy(&self, requested: i64) -> DomainResult<()> {
        self.lock().buy(requested)
    }

    pub fn restock(&self, amount: i64) -> DomainResult<()> {
        self.lock().restock(amount)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Product {
        self.lock().clone()
    }

    /// Run `f` with exclusive access to the product.
    pub fn with<R>(&self, f: impl FnOnce(&mut Product) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Product> {
        // A panic while holding the guard cannot leave the counters half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Product> for SharedProduct {
    fn from(product: Product) -> Self {
        Self::new(product)
    }
}

impl PartialEq for SharedProduct {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SharedProduct {}

impl core::hash::Hash for SharedProduct {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl core::fmt::Display for SharedProduct {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.name, f)
    }
}
