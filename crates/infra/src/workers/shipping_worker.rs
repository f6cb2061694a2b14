use std::io;
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use storefront_shipping::{
    QueueError, Resolution, ShippingError, ShippingQueue, ShippingRecordStore, ShippingService,
    ShippingStatus,
};

/// Default pause between idle polls.
pub const DEFAULT_WORKER_INTERVAL: Duration = Duration::from_millis(500);

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct ShippingWorkerConfig {
    /// Thread name, also used in logs.
    pub name: String,
    /// Pause after a pass that found nothing to do.
    pub interval: Duration,
}

impl Default for ShippingWorkerConfig {
    fn default() -> Self {
        Self {
            name: "shipping-worker".to_string(),
            interval: DEFAULT_WORKER_INTERVAL,
        }
    }
}

impl ShippingWorkerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Counters since the worker started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub batches: u64,
    pub completed: u64,
    pub failed: u64,
    pub already_terminal: u64,
    pub item_errors: u64,
    pub poll_errors: u64,
}

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) -> WorkerStats {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
        self.stats()
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Periodically drains the shipping queue and resolves each shipment.
///
/// Resolution is idempotent, so redelivered ids are harmless.
#[derive(Debug)]
pub struct ShippingWorker;

impl ShippingWorker {
    pub fn spawn<S, Q>(
        service: Arc<ShippingService<S, Q>>,
        config: ShippingWorkerConfig,
    ) -> io::Result<WorkerHandle>
    where
        S: ShippingRecordStore + 'static,
        Q: ShippingQueue + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let worker_stats = stats.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || worker_loop(&service, &config, &shutdown_rx, &worker_stats))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

fn worker_loop<S, Q>(
    service: &ShippingService<S, Q>,
    config: &ShippingWorkerConfig,
    shutdown_rx: &mpsc::Receiver<()>,
    stats: &Mutex<WorkerStats>,
) where
    S: ShippingRecordStore,
    Q: ShippingQueue,
{
    info!(worker = %config.name, "shipping worker started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let idle = match service.process_shipping_batch() {
            Ok(items) => {
                let mut s = stats.lock().unwrap_or_else(PoisonError::into_inner);
                s.batches += 1;
                for item in &items {
                    match &item.outcome {
                        Ok(Resolution::Resolved(ack)) if ack.status == ShippingStatus::Completed => {
                            s.completed += 1
                        }
                        Ok(Resolution::Resolved(_)) => s.failed += 1,
                        Ok(Resolution::AlreadyTerminal { .. }) => s.already_terminal += 1,
                        Err(_) => s.item_errors += 1,
                    }
                }
                if !items.is_empty() {
                    debug!(worker = %config.name, resolved = items.len(), "shipping batch done");
                }
                items.is_empty()
            }
            Err(ShippingError::Queue(QueueError::Closed)) => {
                info!(worker = %config.name, "shipping queue closed");
                break;
            }
            Err(err) => {
                stats.lock().unwrap_or_else(PoisonError::into_inner).poll_errors += 1;
                warn!(worker = %config.name, error = %err, "shipping poll failed");
                true
            }
        };

        if idle {
            match shutdown_rx.recv_timeout(config.interval) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {}
            }
        }
    }

    info!(worker = %config.name, "shipping worker stopped");
}
