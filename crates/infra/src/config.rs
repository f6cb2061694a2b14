//! Environment-driven settings for the fulfillment adapters.

use core::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use storefront_shipping::{ShippingService, ShippingSettings};

use crate::queue::InMemoryShippingQueue;
use crate::queue::in_memory::{DEFAULT_POLL_WAIT, DEFAULT_QUEUE_NAME};
use crate::record_store::InMemoryShippingStore;
use crate::record_store::in_memory::DEFAULT_TABLE_NAME;
use crate::workers::ShippingWorkerConfig;
use crate::workers::shipping_worker::DEFAULT_WORKER_INTERVAL;

pub const ENV_TABLE_NAME: &str = "SHIPPING_TABLE_NAME";
pub const ENV_QUEUE: &str = "SHIPPING_QUEUE";
pub const ENV_BATCH_SIZE: &str = "SHIPPING_BATCH_SIZE";
pub const ENV_POLL_WAIT_MS: &str = "SHIPPING_POLL_WAIT_MS";
pub const ENV_WORKER_INTERVAL_MS: &str = "SHIPPING_WORKER_INTERVAL_MS";

/// In-memory fulfillment stack wired from one config.
pub type InMemoryShippingService =
    ShippingService<Arc<InMemoryShippingStore>, Arc<InMemoryShippingQueue>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentConfig {
    pub table_name: String,
    pub queue_name: String,
    pub batch_size: usize,
    pub poll_wait: Duration,
    pub worker_interval: Duration,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            batch_size: ShippingSettings::DEFAULT_BATCH_SIZE,
            poll_wait: DEFAULT_POLL_WAIT,
            worker_interval: DEFAULT_WORKER_INTERVAL,
        }
    }
}

impl FulfillmentConfig {
    /// Read the process environment. Unset or malformed values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let text = |key: &str, default: String| match lookup(key) {
            Some(v) if !v.trim().is_empty() => v,
            _ => default,
        };

        Self {
            table_name: text(ENV_TABLE_NAME, defaults.table_name),
            queue_name: text(ENV_QUEUE, defaults.queue_name),
            batch_size: parsed(&lookup, ENV_BATCH_SIZE, defaults.batch_size).max(1),
            poll_wait: Duration::from_millis(parsed(
                &lookup,
                ENV_POLL_WAIT_MS,
                defaults.poll_wait.as_millis() as u64,
            )),
            worker_interval: Duration::from_millis(parsed(
                &lookup,
                ENV_WORKER_INTERVAL_MS,
                defaults.worker_interval.as_millis() as u64,
            )),
        }
    }

    pub fn shipping_settings(&self) -> ShippingSettings {
        ShippingSettings::default().with_batch_size(self.batch_size)
    }

    pub fn worker_config(&self) -> ShippingWorkerConfig {
        ShippingWorkerConfig::default().with_interval(self.worker_interval)
    }

    pub fn build_store(&self) -> Arc<InMemoryShippingStore> {
        InMemoryShippingStore::arc(self.table_name.clone())
    }

    pub fn build_queue(&self) -> Arc<InMemoryShippingQueue> {
        Arc::new(InMemoryShippingQueue::new(self.queue_name.clone()).with_poll_wait(self.poll_wait))
    }

    /// Service over fresh in-memory adapters, with these settings applied.
    pub fn build_in_memory_service(&self) -> InMemoryShippingService {
        ShippingService::new(self.build_store(), self.build_queue())
            .with_settings(self.shipping_settings())
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + core::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "malformed setting; using default");
            default
        }),
    }
}
