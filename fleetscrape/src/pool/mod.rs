//! Bounded worker pool running one session per device.
//!
//! Every device becomes one job on a queue sized to the device list, so
//! queuing never waits. `workers` tasks take jobs one at a time and run each
//! device to completion before taking the next, which bounds the number of
//! simultaneous sessions. Results come back on a second channel in
//! completion order; the stream ends once every worker has exited.

mod builder;
mod run;
mod settings;

pub use builder::CollectorBuilder;
pub use run::{RunHandle, RunSummary};
pub use settings::{CommandFailurePolicy, RunSettings, TranscriptCapture};

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{Mutex, mpsc};

use crate::command::{CommandBatch, CommandCatalog};
use crate::device::DeviceProfile;
use crate::dialect::DialectRegistry;
use crate::driver::{DeviceSessionDriver, SessionRegistry};
use crate::transport::{Credentials, Transport};

/// One device and the batch selected for it.
#[derive(Debug)]
struct DeviceJob {
    device: DeviceProfile,
    batch: CommandBatch,
}

/// Runs command batches across a device fleet.
pub struct Collector<T: Transport> {
    transport: Arc<T>,
    credentials: Arc<Credentials>,
    dialects: Arc<DialectRegistry>,
    settings: Arc<RunSettings>,
}

impl<T: Transport> fmt::Debug for Collector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("username", &self.credentials.username)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Collector<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        credentials: Arc<Credentials>,
        dialects: Arc<DialectRegistry>,
        settings: Arc<RunSettings>,
    ) -> Self {
        Self {
            transport,
            credentials,
            dialects,
            settings,
        }
    }

    /// Run settings.
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Credentials applied to every device.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Dialects in use.
    pub fn dialects(&self) -> &DialectRegistry {
        &self.dialects
    }

    /// Start collecting from `devices`.
    ///
    /// Each device gets the batch for its OS family from `catalog`. Must be
    /// called from within a tokio runtime; workers are spawned immediately.
    pub fn run(&self, devices: Vec<DeviceProfile>, catalog: &CommandCatalog) -> RunHandle {
        let total = devices.len();
        let capacity = total.max(1);
        let workers = self.settings.workers.min(total);
        let registry = SessionRegistry::new();

        // One slot per device and the receiver is alive, so queuing cannot fail.
        let (job_tx, job_rx) = mpsc::channel(capacity);
        for device in devices {
            let batch = catalog.batch_for(device.family).clone();
            job_tx
                .try_send(DeviceJob { device, batch })
                .expect("job queue holds every device");
        }
        drop(job_tx);

        let (result_tx, result_rx) = mpsc::channel(capacity);
        let jobs = Arc::new(Mutex::new(job_rx));
        let driver =
            DeviceSessionDriver::new(Arc::clone(&self.transport), Arc::clone(&self.credentials))
                .with_dialects(Arc::clone(&self.dialects))
                .with_settings(Arc::clone(&self.settings))
                .with_registry(registry.clone());

        info!("collecting from {} devices with {} workers", total, workers);

        for worker_id in 0..workers {
            let jobs = Arc::clone(&jobs);
            let results = result_tx.clone();
            let driver = driver.clone();

            tokio::spawn(async move {
                loop {
                    let job = jobs.lock().await.recv().await;
                    let Some(DeviceJob { device, batch }) = job else {
                        break;
                    };

                    debug!("worker {}: {}", worker_id, device);
                    let result = driver.run(&device, &batch).await;
                    if results.send(result).await.is_err() {
                        debug!("worker {}: result receiver dropped", worker_id);
                        break;
                    }
                }
                debug!("worker {}: done", worker_id);
            });
        }

        RunHandle::new(result_rx, total, registry)
    }
}
