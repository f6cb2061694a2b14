//! Shipment lifecycle orchestration.
//!
//! ```text
//! create_shipping
//!   1. validate shipping type            (no IO)
//!   2. validate due date > now           (no IO)
//!   3. store.create_shipping(CREATED)    → shipping_id
//!   4. queue.send_new_shipping(id)
//!   5. store.update_shipping_status(IN_PROGRESS)
//!
//! process_shipping
//!   read record → terminal? skip : (due_date < now ? FAILED : COMPLETED)
//! ```
//!
//! Steps 3 to 5 run strictly in order and the first failure aborts the rest, so
//! a notification is never emitted for a record that was not persisted. A
//! failure after step 3 leaves the record in `CREATED`; the next resolution
//! pass (or an operator) settles it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use storefront_core::{Clock, DomainError, OrderId, ShippingId, SystemClock};

use crate::error::ShippingError;
use crate::queue::ShippingQueue;
use crate::record::{ShippingRecord, WriteAck};
use crate::settings::ShippingSettings;
use crate::shipping_type::ShippingType;
use crate::status::ShippingStatus;
use crate::store::ShippingRecordStore;

static AVAILABLE_SHIPPING_TYPES: [ShippingType; 3] = ShippingType::ALL;

/// Outcome of resolving a single shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The terminal status was written.
    Resolved(WriteAck),
    /// The shipment had already been resolved; nothing was written.
    AlreadyTerminal {
        shipping_id: ShippingId,
        status: ShippingStatus,
    },
}

impl Resolution {
    pub fn status(&self) -> ShippingStatus {
        match self {
            Resolution::Resolved(ack) => ack.status,
            Resolution::AlreadyTerminal { status, .. } => *status,
        }
    }

    pub fn shipping_id(&self) -> &ShippingId {
        match self {
            Resolution::Resolved(ack) => &ack.shipping_id,
            Resolution::AlreadyTerminal { shipping_id, .. } => shipping_id,
        }
    }
}

/// Per-item result of a batch resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub shipping_id: ShippingId,
    pub outcome: Result<Resolution, ShippingError>,
}

/// The part of the shipping service that orders and shipment handles use.
pub trait ShippingBackend: Send + Sync {
    /// Check a request without touching the store or the queue.
    fn validate_shipping(
        &self,
        shipping_type: &str,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingType, ShippingError>;

    fn create_shipping(
        &self,
        shipping_type: &str,
        product_ids: &[String],
        order_id: &OrderId,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, ShippingError>;

    fn check_status(&self, shipping_id: &ShippingId) -> Result<ShippingStatus, ShippingError>;
}

impl<B> ShippingBackend for Arc<B>
where
    B: ShippingBackend + ?Sized,
{
    fn validate_shipping(
        &self,
        shipping_type: &str,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingType, ShippingError> {
        (**self).validate_shipping(shipping_type, due_date)
    }

    fn create_shipping(
        &self,
        shipping_type: &str,
        product_ids: &[String],
        order_id: &OrderId,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, ShippingError> {
        (**self).create_shipping(shipping_type, product_ids, order_id, due_date)
    }

    fn check_status(&self, shipping_id: &ShippingId) -> Result<ShippingStatus, ShippingError> {
        (**self).check_status(shipping_id)
    }
}

impl<B> ShippingBackend for &B
where
    B: ShippingBackend + ?Sized,
{
    fn validate_shipping(
        &self,
        shipping_type: &str,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingType, ShippingError> {
        (**self).validate_shipping(shipping_type, due_date)
    }

    fn create_shipping(
        &self,
        shipping_type: &str,
        product_ids: &[String],
        order_id: &OrderId,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, ShippingError> {
        (**self).create_shipping(shipping_type, product_ids, order_id, due_date)
    }

    fn check_status(&self, shipping_id: &ShippingId) -> Result<ShippingStatus, ShippingError> {
        (**self).check_status(shipping_id)
    }
}

/// Shipment lifecycle state machine over a record store and a queue.
///
/// ## Generic Parameters
///
/// - `S`: record store (must implement `ShippingRecordStore`)
/// - `Q`: queue (must implement `ShippingQueue`)
pub struct ShippingService<S, Q> {
    store: S,
    queue: Q,
    clock: Arc<dyn Clock>,
    settings: ShippingSettings,
}

impl<S, Q> core::fmt::Debug for ShippingService<S, Q> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShippingService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S, Q> ShippingService<S, Q>
where
    S: ShippingRecordStore,
    Q: ShippingQueue,
{
    pub fn new(store: S, queue: Q) -> Self {
        Self {
            store,
            queue,
            clock: Arc::new(SystemClock),
            settings: ShippingSettings::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_settings(mut self, settings: ShippingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn settings(&self) -> ShippingSettings {
        self.settings
    }

    /// Carriers accepted by `create_shipping`.
    pub fn list_available_shipping_type() -> &'static [ShippingType] {
        &AVAILABLE_SHIPPING_TYPES
    }

    pub fn validate_shipping(
        &self,
        shipping_type: &str,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingType, ShippingError> {
        let shipping_type: ShippingType = shipping_type.parse()?;

        if due_date <= self.clock.now() {
            return Err(DomainError::validation(
                "Shipping due datetime must be greater than datetime now",
            )
            .into());
        }

        Ok(shipping_type)
    }

    /// Validate, persist, notify, then mark the shipment in progress.
    #[instrument(
        skip(self, product_ids, order_id),
        fields(order_id = %order_id, product_count = product_ids.len()),
        err
    )]
    pub fn create_shipping(
        &self,
        shipping_type: &str,
        product_ids: &[String],
        order_id: &OrderId,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, ShippingError> {
        let shipping_type = self.validate_shipping(shipping_type, due_date)?;

        let shipping_id = self.store.create_shipping(
            shipping_type,
            product_ids,
            order_id,
            ShippingStatus::Created,
            due_date,
        )?;
        debug!(shipping_id = %shipping_id, "shipping record created");

        let message_id = self.queue.send_new_shipping(&shipping_id)?;
        debug!(shipping_id = %shipping_id, message_id = %message_id, "shipping published");

        self.store
            .update_shipping_status(&shipping_id, ShippingStatus::InProgress)?;

        info!(
            shipping_id = %shipping_id,
            shipping_type = %shipping_type,
            due_date = %due_date.to_rfc3339(),
            "shipping in progress"
        );
        Ok(shipping_id)
    }

    /// Current record for `shipping_id`, or a not-found error.
    pub fn get_shipping(&self, shipping_id: &ShippingId) -> Result<ShippingRecord, ShippingError> {
        self.store
            .get_shipping(shipping_id)?
            .ok_or_else(|| DomainError::not_found(format!("shipping {shipping_id}")).into())
    }

    pub fn check_status(&self, shipping_id: &ShippingId) -> Result<ShippingStatus, ShippingError> {
        Ok(self.get_shipping(shipping_id)?.shipping_status)
    }

    /// Resolve a shipment against its due date.
    ///
    /// Already-terminal shipments are left untouched, which makes redelivered
    /// queue messages harmless.
    #[instrument(skip(self, shipping_id), fields(shipping_id = %shipping_id), err)]
    pub fn process_shipping(&self, shipping_id: &ShippingId) -> Result<Resolution, ShippingError> {
        let record = self.get_shipping(shipping_id)?;

        let next = if record.is_overdue(self.clock.now()) {
            ShippingStatus::Failed
        } else {
            ShippingStatus::Completed
        };

        if !record.shipping_status.can_transition_to(next) {
            debug!(status = %record.shipping_status, next = %next, "shipping already resolved; skipping");
            return Ok(Resolution::AlreadyTerminal {
                shipping_id: record.shipping_id,
                status: record.shipping_status,
            });
        }

        let ack = self.store.update_shipping_status(shipping_id, next)?;
        info!(status = %ack.status, "shipping resolved");
        Ok(Resolution::Resolved(ack))
    }

    /// Drain up to `settings.batch_size` pending ids from the queue and resolve each.
    ///
    /// Only a failure to poll the queue fails the whole call; per-item failures
    /// are reported in the returned list.
    #[instrument(skip(self), fields(batch_size = self.settings.batch_size), err)]
    pub fn process_shipping_batch(&self) -> Result<Vec<BatchItem>, ShippingError> {
        let ids = self.queue.poll_shipping(self.settings.batch_size)?;

        let items: Vec<BatchItem> = ids
            .into_iter()
            .map(|shipping_id| {
                let outcome = self.process_shipping(&shipping_id);
                if let Err(err) = &outcome {
                    warn!(
                        shipping_id = %shipping_id,
                        error = %err,
                        infrastructure = err.is_infrastructure(),
                        "failed to resolve shipping"
                    );
                }
                BatchItem {
                    shipping_id,
                    outcome,
                }
            })
            .collect();

        debug!(processed = items.len(), "shipping batch processed");
        Ok(items)
    }
}

impl<S, Q> ShippingBackend for ShippingService<S, Q>
where
    S: ShippingRecordStore,
    Q: ShippingQueue,
{
    fn validate_shipping(
        &self,
        shipping_type: &str,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingType, ShippingError> {
        ShippingService::validate_shipping(self, shipping_type, due_date)
    }

    fn create_shipping(
        &self,
        shipping_type: &str,
        product_ids: &[String],
        order_id: &OrderId,
        due_date: DateTime<Utc>,
    ) -> Result<ShippingId, ShippingError> {
        ShippingService::create_shipping(self, shipping_type, product_ids, order_id, due_date)
    }

    fn check_status(&self, shipping_id: &ShippingId) -> Result<ShippingStatus, ShippingError> {
        ShippingService::check_status(self, shipping_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use chrono::{Duration, TimeZone};
    use storefront_core::{FixedClock, MessageId};

    use crate::queue::QueueError;
    use crate::store::RecordStoreError;

    /// Store double that records every call.
    #[derive(Default)]
    struct RecordingStore {
        records: Mutex<HashMap<ShippingId, ShippingRecord>>,
        created_with: Mutex<Vec<ShippingStatus>>,
        updates: Mutex<Vec<(ShippingId, ShippingStatus)>>,
        next: Mutex<u32>,
        fail_create: bool,
    }

    impl RecordingStore {
        fn create_calls(&self) -> usize {
            self.created_with.lock().unwrap().len()
        }

        fn update_calls(&self) -> usize {
            self.updates.lock().unwrap().len()
        }

        fn insert(&self, record: ShippingRecord) {
            self.records
                .lock()
                .unwrap()
                .insert(record.shipping_id.clone(), record);
        }
    }

    impl ShippingRecordStore for RecordingStore {
        fn create_shipping(
            &self,
            shipping_type: ShippingType,
            product_ids: &[String],
            order_id: &OrderId,
            status: ShippingStatus,
            due_date: DateTime<Utc>,
        ) -> Result<ShippingId, RecordStoreError> {
            self.created_with.lock().unwrap().push(status);
            if self.fail_create {
                return Err(RecordStoreError::Storage("table unavailable".into()));
            }
            let mut next = self.next.lock().unwrap();
            *next += 1;
            let shipping_id = ShippingId::new(format!("shipping-{}", *next)).unwrap();
            self.insert(ShippingRecord {
                shipping_id: shipping_id.clone(),
                order_id: order_id.clone(),
                shipping_type,
                product_ids: product_ids.to_vec(),
                shipping_status: status,
                created_date: t0(),
                due_date,
            });
            Ok(shipping_id)
        }

        fn get_shipping(
            &self,
            shipping_id: &ShippingId,
        ) -> Result<Option<ShippingRecord>, RecordStoreError> {
            Ok(self.records.lock().unwrap().get(shipping_id).cloned())
        }

        fn update_shipping_status(
            &self,
            shipping_id: &ShippingId,
            status: ShippingStatus,
        ) -> Result<WriteAck, RecordStoreError> {
            self.updates
                .lock()
                .unwrap()
                .push((shipping_id.clone(), status));
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(shipping_id)
                .ok_or_else(|| RecordStoreError::NotFound(shipping_id.clone()))?;
            record.shipping_status = status;
            Ok(WriteAck {
                shipping_id: shipping_id.clone(),
                status,
                written_at: t0(),
            })
        }
    }

    /// Queue double backed by a deque.
    #[derive(Default)]
    struct RecordingQueue {
        pending: Mutex<VecDeque<ShippingId>>,
        sent: Mutex<Vec<ShippingId>>,
        closed: bool,
    }

    impl RecordingQueue {
        fn sent(&self) -> Vec<ShippingId> {
            self.sent.lock().unwrap().clone()
        }

        fn push(&self, id: &ShippingId) {
            self.pending.lock().unwrap().push_back(id.clone());
        }
    }

    impl ShippingQueue for RecordingQueue {
        fn send_new_shipping(&self, shipping_id: &ShippingId) -> Result<MessageId, QueueError> {
            if self.closed {
                return Err(QueueError::Closed);
            }
            self.sent.lock().unwrap().push(shipping_id.clone());
            self.push(shipping_id);
            Ok(MessageId::new(format!("msg-{shipping_id}")).unwrap())
        }

        fn poll_shipping(&self, batch_size: usize) -> Result<Vec<ShippingId>, QueueError> {
            if self.closed {
                return Err(QueueError::Closed);
            }
            let mut pending = self.pending.lock().unwrap();
            let n = batch_size.min(pending.len());
            Ok(pending.drain(..n).collect())
        }
    }

    type TestService = ShippingService<Arc<RecordingStore>, Arc<RecordingQueue>>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn service_at(
        now: DateTime<Utc>,
        store: &Arc<RecordingStore>,
        queue: &Arc<RecordingQueue>,
    ) -> TestService {
        ShippingService::new(store.clone(), queue.clone()).with_clock(FixedClock::new(now))
    }

    fn setup() -> (TestService, Arc<RecordingStore>, Arc<RecordingQueue>) {
        let store = Arc::new(RecordingStore::default());
        let queue = Arc::new(RecordingQueue::default());
        (service_at(t0(), &store, &queue), store, queue)
    }

    fn carrier() -> &'static str {
        TestService::list_available_shipping_type()[0].as_str()
    }

    fn order_id(s: &str) -> OrderId {
        OrderId::new(s).unwrap()
    }

    fn products(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lists_known_carriers() {
        let types = TestService::list_available_shipping_type();
        assert!(!types.is_empty());
        assert!(types.contains(&ShippingType::NovaPoshta));
    }

    #[test]
    fn unknown_shipping_type_is_rejected_before_any_write() {
        let (service, store, queue) = setup();

        let err = service
            .create_shipping(
                "UnknownCarrier",
                &products(&["p1"]),
                &order_id("order-1"),
                t0() + Duration::hours(1),
            )
            .unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("Shipping type is not available"));
        assert_eq!(store.create_calls(), 0);
        assert!(queue.sent().is_empty());
    }

    #[test]
    fn past_due_date_is_rejected_before_any_write() {
        let (service, store, _queue) = setup();

        let err = service
            .create_shipping(
                carrier(),
                &products(&["p1"]),
                &order_id("order-2"),
                t0() - Duration::minutes(1),
            )
            .unwrap_err();

        assert!(err.is_validation());
        assert!(
            err.to_string()
                .contains("Shipping due datetime must be greater than datetime now")
        );
        assert_eq!(store.create_calls(), 0);
    }

    #[test]
    fn due_date_equal_to_now_is_rejected() {
        let (service, store, _queue) = setup();
        let err = service
            .create_shipping(carrier(), &products(&["p1"]), &order_id("o"), t0())
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.create_calls(), 0);
    }

    #[test]
    fn create_persists_created_publishes_and_moves_to_in_progress() {
        let (service, store, queue) = setup();

        let shipping_id = service
            .create_shipping(
                carrier(),
                &products(&["prod1", "prod2"]),
                &order_id("order-3"),
                t0() + Duration::hours(24),
            )
            .unwrap();

        assert_eq!(*store.created_with.lock().unwrap(), vec![ShippingStatus::Created]);
        assert_eq!(queue.sent(), vec![shipping_id.clone()]);
        assert_eq!(
            service.check_status(&shipping_id).unwrap(),
            ShippingStatus::InProgress
        );

        let record = service.get_shipping(&shipping_id).unwrap();
        assert_eq!(record.order_id, order_id("order-3"));
        assert_eq!(record.product_ids, products(&["prod1", "prod2"]));
        assert_eq!(record.shipping_type, ShippingType::NovaPoshta);
    }

    #[test]
    fn store_failure_aborts_before_publishing() {
        let store = Arc::new(RecordingStore {
            fail_create: true,
            ..Default::default()
        });
        let queue = Arc::new(RecordingQueue::default());
        let service = service_at(t0(), &store, &queue);

        let err = service
            .create_shipping(
                carrier(),
                &products(&["p"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap_err();

        assert!(matches!(err, ShippingError::RecordStore(RecordStoreError::Storage(_))));
        assert!(queue.sent().is_empty());
        assert_eq!(store.update_calls(), 0);
    }

    #[test]
    fn queue_failure_leaves_record_created() {
        let store = Arc::new(RecordingStore::default());
        let queue = Arc::new(RecordingQueue {
            closed: true,
            ..Default::default()
        });
        let service = service_at(t0(), &store, &queue);

        let err = service
            .create_shipping(
                carrier(),
                &products(&["p"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap_err();

        assert_eq!(err, ShippingError::Queue(QueueError::Closed));
        assert_eq!(store.update_calls(), 0);
        let records = store.records.lock().unwrap();
        let record = records.values().next().unwrap();
        assert_eq!(record.shipping_status, ShippingStatus::Created);
    }

    #[test]
    fn check_status_of_unknown_id_is_not_found() {
        let (service, _store, _queue) = setup();
        let err = service
            .check_status(&ShippingId::new("missing").unwrap())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn process_before_due_date_completes() {
        let (service, _store, _queue) = setup();
        let id = service
            .create_shipping(
                carrier(),
                &products(&["test_product"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap();

        let resolution = service.process_shipping(&id).unwrap();

        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(resolution.status(), ShippingStatus::Completed);
        assert_eq!(service.check_status(&id).unwrap(), ShippingStatus::Completed);
    }

    #[test]
    fn process_after_due_date_fails() {
        let (service, store, queue) = setup();
        let id = service
            .create_shipping(
                carrier(),
                &products(&["late"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap();

        let later = service_at(t0() + Duration::hours(2), &store, &queue);
        let resolution = later.process_shipping(&id).unwrap();

        assert_eq!(resolution.status(), ShippingStatus::Failed);
        assert_eq!(later.check_status(&id).unwrap(), ShippingStatus::Failed);
    }

    #[test]
    fn process_exactly_at_due_date_completes() {
        let (service, store, queue) = setup();
        let due = t0() + Duration::hours(1);
        let id = service
            .create_shipping(carrier(), &products(&["on_time"]), &order_id("o"), due)
            .unwrap();

        let at_due = service_at(due, &store, &queue);
        let resolution = at_due.process_shipping(&id).unwrap();

        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(resolution.status(), ShippingStatus::Completed);
        assert_eq!(at_due.check_status(&id).unwrap(), ShippingStatus::Completed);
    }

    #[test]
    fn process_resolves_records_still_in_created() {
        let (service, store, _queue) = setup();
        let id = ShippingId::new("seeded").unwrap();
        store.insert(ShippingRecord {
            shipping_id: id.clone(),
            order_id: order_id("o"),
            shipping_type: ShippingType::UkrPoshta,
            product_ids: products(&["past_due_product"]),
            shipping_status: ShippingStatus::Created,
            created_date: t0() - Duration::days(2),
            due_date: t0() - Duration::days(1),
        });

        assert_eq!(
            service.process_shipping(&id).unwrap().status(),
            ShippingStatus::Failed
        );
    }

    #[test]
    fn process_is_idempotent_once_terminal() {
        let (service, store, _queue) = setup();
        let id = service
            .create_shipping(
                carrier(),
                &products(&["p"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap();
        service.process_shipping(&id).unwrap();
        let writes = store.update_calls();

        let again = service.process_shipping(&id).unwrap();

        assert_eq!(
            again,
            Resolution::AlreadyTerminal {
                shipping_id: id.clone(),
                status: ShippingStatus::Completed,
            }
        );
        assert_eq!(store.update_calls(), writes);
    }

    #[test]
    fn process_unknown_id_is_not_found() {
        let (service, store, _queue) = setup();
        let err = service
            .process_shipping(&ShippingId::new("missing").unwrap())
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.update_calls(), 0);
    }

    #[test]
    fn batch_resolves_every_polled_shipment() {
        let (service, _store, _queue) = setup();
        let ids: Vec<_> = (0..3)
            .map(|i| {
                service
                    .create_shipping(
                        carrier(),
                        &products(&[&format!("batch_product_{i}")]),
                        &order_id(&format!("batch_order_{i}")),
                        t0() + Duration::hours(i + 1),
                    )
                    .unwrap()
            })
            .collect();

        let items = service.process_shipping_batch().unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item.outcome.is_ok()));
        for id in &ids {
            assert_eq!(service.check_status(id).unwrap(), ShippingStatus::Completed);
        }
    }

    #[test]
    fn batch_failure_on_one_item_does_not_block_others() {
        let (service, _store, queue) = setup();
        let good = service
            .create_shipping(
                carrier(),
                &products(&["p"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap();
        let missing = ShippingId::new("ghost").unwrap();
        // Put the unknown id in front of the real one.
        let real = queue.pending.lock().unwrap().pop_front().unwrap();
        queue.push(&missing);
        queue.push(&real);

        let items = service.process_shipping_batch().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].shipping_id, missing);
        assert!(items[0].outcome.as_ref().unwrap_err().is_not_found());
        assert!(!items[0].outcome.as_ref().unwrap_err().is_infrastructure());
        assert_eq!(items[1].shipping_id, good);
        assert_eq!(
            items[1].outcome.as_ref().unwrap().status(),
            ShippingStatus::Completed
        );
    }

    #[test]
    fn batch_tolerates_redelivered_ids() {
        let (service, store, queue) = setup();
        let id = service
            .create_shipping(
                carrier(),
                &products(&["p"]),
                &order_id("o"),
                t0() + Duration::hours(1),
            )
            .unwrap();
        queue.push(&id);

        let items = service.process_shipping_batch().unwrap();

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].outcome, Ok(Resolution::Resolved(_))));
        assert!(matches!(
            items[1].outcome,
            Ok(Resolution::AlreadyTerminal { .. })
        ));
        // IN_PROGRESS during create plus a single terminal write.
        assert_eq!(store.update_calls(), 2);
    }

    #[test]
    fn batch_respects_batch_size() {
        let (service, _store, queue) = setup();
        let service = service.with_settings(ShippingSettings::default().with_batch_size(2));
        for i in 0..3 {
            service
                .create_shipping(
                    carrier(),
                    &products(&["p"]),
                    &order_id(&format!("o{i}")),
                    t0() + Duration::hours(1),
                )
                .unwrap();
        }

        assert_eq!(service.process_shipping_batch().unwrap().len(), 2);
        assert_eq!(queue.pending.lock().unwrap().len(), 1);
    }

    #[test]
    fn batch_surfaces_poll_failure() {
        let store = Arc::new(RecordingStore::default());
        let queue = Arc::new(RecordingQueue {
            closed: true,
            ..Default::default()
        });
        let service = service_at(t0(), &store, &queue);
        assert_eq!(
            service.process_shipping_batch().unwrap_err(),
            ShippingError::Queue(QueueError::Closed)
        );
    }
}
