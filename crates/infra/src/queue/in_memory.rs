use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, instrument};

use storefront_core::{MessageId, ShippingId};
use storefront_shipping::{QueueError, ShippingQueue};

pub const DEFAULT_QUEUE_NAME: &str = "shipping-queue";

/// Default bounded wait for `poll_shipping` on an empty queue.
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<(MessageId, ShippingId)>,
    closed: bool,
}

/// In-memory FIFO queue of shipping ids.
///
/// - No IO / no async
/// - `poll_shipping` blocks up to `poll_wait` while the queue is empty
/// - Delivered messages are removed; redelivery is simulated with `redeliver`
#[derive(Debug)]
pub struct InMemoryShippingQueue {
    name: String,
    state: Mutex<QueueState>,
    ready: Condvar,
    poll_wait: Duration,
}

impl Default for InMemoryShippingQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_NAME)
    }
}

impl InMemoryShippingQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
            poll_wait: DEFAULT_POLL_WAIT,
        }
    }

    pub fn arc(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    pub fn with_poll_wait(mut self, poll_wait: Duration) -> Self {
        self.poll_wait = poll_wait;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn poll_wait(&self) -> Duration {
        self.poll_wait
    }

    /// Messages waiting to be polled; 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.messages.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put an already-delivered id back on the queue (at-least-once delivery).
    pub fn redeliver(&self, shipping_id: &ShippingId) -> Result<MessageId, QueueError> {
        self.send_new_shipping(shipping_id)
    }

    /// Stop accepting messages and wake any waiting pollers.
    ///
    /// Messages already queued can still be drained.
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.ready.notify_all();
    }
}

fn poisoned() -> QueueError {
    QueueError::Transport("lock poisoned".to_string())
}

impl ShippingQueue for InMemoryShippingQueue {
    #[instrument(skip(self, shipping_id), fields(queue = %self.name, shipping_id = %shipping_id), err)]
    fn send_new_shipping(&self, shipping_id: &ShippingId) -> Result<MessageId, QueueError> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        if state.closed {
            return Err(QueueError::Closed);
        }

        let message_id = MessageId::generate();
        state.messages.push_back((message_id.clone(), shipping_id.clone()));
        drop(state);
        self.ready.notify_one();

        debug!(message_id = %message_id, "shipping message sent");
        Ok(message_id)
    }

    fn poll_shipping(&self, batch_size: usize) -> Result<Vec<ShippingId>, QueueError> {
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        let state = self.state.lock().map_err(|_| poisoned())?;
        let (mut state, _timeout) = self
            .ready
            .wait_timeout_while(state, self.poll_wait, |s| {
                s.messages.is_empty() && !s.closed
            })
            .map_err(|_| poisoned())?;

        if state.messages.is_empty() && state.closed {
            return Err(QueueError::Closed);
        }

        let take = batch_size.min(state.messages.len());
        Ok(state
            .messages
            .drain(..take)
            .map(|(_, shipping_id)| shipping_id)
            .collect())
    }
}
