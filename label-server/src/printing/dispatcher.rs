//! Print Dispatcher
//!
//! Owns the single printer connection and serializes access to it. Jobs are
//! served in arrival order (tokio's mutex is fair); at most
//! `max_queue_depth` submissions may be in flight or waiting, the rest are
//! rejected as busy.
//!
//! Connection state machine:
//!
//! ```text
//! Disconnected --open--> Connected --submit--> Busy --ack--> Connected
//!                            ^                   |
//!                            |                   +--timeout / write error / fault--> Disconnected
//!                            +---------------------------------------- next submit opens again
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use tspl_printer::{PrintError, PrintResult, PrinterConnection, PrinterDevice, PrinterStatus};

use crate::labels::{JobResult, PrintJob};
use crate::utils::{AppError, AppResult};

/// Printer connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Busy,
}

impl ConnectionState {
    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Busy => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Busy,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Result of a connection test
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub device: String,
    pub ready: bool,
    pub printer_status: String,
}

/// Snapshot for the health endpoint, read without touching the device
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub device: String,
    pub state: ConnectionState,
    pub queued: usize,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

/// Releases a queue slot when dropped
struct QueueTicket<'a> {
    queued: &'a AtomicUsize,
}

impl Drop for QueueTicket<'_> {
    fn drop(&mut self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks the printer as in use until disarmed
///
/// Dropped while armed, the caller's future was cancelled mid-exchange and
/// the connection went with it: state falls back to Disconnected and a job
/// counts as failed.
struct InFlight<'a> {
    dispatcher: &'a PrintDispatcher,
    counts_as_job: bool,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.dispatcher.set_state(ConnectionState::Disconnected);
        if self.counts_as_job {
            self.dispatcher.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
        warn!("Printer exchange cancelled, connection dropped");
    }
}

pub struct PrintDispatcher {
    device: Arc<dyn PrinterDevice>,
    connection: Mutex<Option<Box<dyn PrinterConnection>>>,
    state: AtomicU8,
    queued: AtomicUsize,
    max_queue_depth: usize,
    default_timeout: Duration,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
}

impl PrintDispatcher {
    pub fn new(
        device: Arc<dyn PrinterDevice>,
        max_queue_depth: usize,
        default_timeout: Duration,
    ) -> Self {
        Self {
            device,
            connection: Mutex::new(None),
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            queued: AtomicUsize::new(0),
            max_queue_depth: max_queue_depth.max(1),
            default_timeout,
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
        }
    }

    pub fn device(&self) -> String {
        self.device.describe()
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    fn enter_queue(&self) -> AppResult<QueueTicket<'_>> {
        let ahead = self.queued.fetch_add(1, Ordering::SeqCst);
        let ticket = QueueTicket {
            queued: &self.queued,
        };
        if ahead >= self.max_queue_depth {
            return Err(AppError::DeviceBusy(format!(
                "{} print requests already queued",
                ahead
            )));
        }
        Ok(ticket)
    }

    fn in_flight(&self, counts_as_job: bool) -> InFlight<'_> {
        InFlight {
            dispatcher: self,
            counts_as_job,
            armed: true,
        }
    }

    /// Send a job and wait for the printer to acknowledge it
    ///
    /// `timeout` covers opening the connection, writing and the status
    /// round-trip; time spent waiting for earlier jobs is not counted.
    #[instrument(
        skip(self, job, timeout),
        fields(job_id = %job.id(), labels = job.label_count(), copies = job.copies())
    )]
    pub async fn submit(&self, job: PrintJob, timeout: Option<Duration>) -> AppResult<JobResult> {
        let _ticket = self.enter_queue()?;
        let timeout = timeout.unwrap_or(self.default_timeout);
        let data = job.encode();

        let mut slot = self.connection.lock().await;
        let started = Instant::now();
        self.set_state(ConnectionState::Busy);
        let mut in_flight = self.in_flight(true);

        let delivery = exchange(self.device.as_ref(), &mut slot, Some(data.as_slice()));
        let outcome = tokio::time::timeout(timeout, delivery).await;
        in_flight.disarm();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(status)) => {
                self.set_state(ConnectionState::Connected);
                self.jobs_completed.fetch_add(1, Ordering::Relaxed);
                info!(bytes = data.len(), elapsed_ms, status = %status, "Print job completed");
                Ok(JobResult {
                    job_id: job.id(),
                    labels: job.label_count(),
                    copies: job.copies(),
                    printer_status: status.to_string(),
                    elapsed_ms,
                })
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Print job failed");
                Err(e.into())
            }
            Err(_) => {
                *slot = None;
                self.set_state(ConnectionState::Disconnected);
                self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Print job timed out, connection dropped"
                );
                Err(AppError::Timeout(format!(
                    "{} did not acknowledge the job within {} ms",
                    self.device.describe(),
                    timeout.as_millis()
                )))
            }
        }
    }

    /// Open the device if needed and round-trip a status query, no job
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> AppResult<ConnectionStatus> {
        let _ticket = self.enter_queue()?;
        let mut slot = self.connection.lock().await;
        let mut in_flight = self.in_flight(false);

        let probe = exchange(self.device.as_ref(), &mut slot, None);
        let outcome = tokio::time::timeout(self.default_timeout, probe).await;
        in_flight.disarm();

        match outcome {
            Ok(Ok(status)) => {
                self.set_state(ConnectionState::Connected);
                info!(status = %status, "Printer connection test passed");
                Ok(ConnectionStatus {
                    device: self.device.describe(),
                    ready: status.is_ready(),
                    printer_status: status.to_string(),
                })
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                warn!(error = %e, "Printer connection test failed");
                Err(e.into())
            }
            Err(_) => {
                *slot = None;
                self.set_state(ConnectionState::Disconnected);
                Err(AppError::Timeout(format!(
                    "{} did not answer within {} ms",
                    self.device.describe(),
                    self.default_timeout.as_millis()
                )))
            }
        }
    }

    /// Current state, from atomics only
    pub fn health_check(&self) -> ServiceStatus {
        ServiceStatus {
            device: self.device.describe(),
            state: self.state(),
            queued: self.queued.load(Ordering::SeqCst),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }

    /// Open the connection ahead of the first job
    #[instrument(skip(self))]
    pub async fn connect(&self) -> AppResult<()> {
        let mut slot = self.connection.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        match tokio::time::timeout(self.default_timeout, self.device.open()).await {
            Ok(Ok(conn)) => {
                *slot = Some(conn);
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                Err(e.into())
            }
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                Err(AppError::Timeout(format!(
                    "{} did not accept a connection within {} ms",
                    self.device.describe(),
                    self.default_timeout.as_millis()
                )))
            }
        }
    }

    /// Close the connection; waits for the job in progress
    pub async fn shutdown(&self) {
        let mut slot = self.connection.lock().await;
        if let Some(mut conn) = slot.take()
            && let Err(e) = conn.close().await
        {
            warn!(error = %e, "Failed to close printer connection");
        }
        self.set_state(ConnectionState::Disconnected);
        info!(device = %self.device.describe(), "Printer connection closed");
    }
}

/// Take (or open) the connection, optionally write `data`, then query status
///
/// The connection goes back into `slot` only when the device answered ready;
/// on any error it is dropped.
async fn exchange(
    device: &dyn PrinterDevice,
    slot: &mut Option<Box<dyn PrinterConnection>>,
    data: Option<&[u8]>,
) -> PrintResult<PrinterStatus> {
    let mut conn = match slot.take() {
        Some(conn) => conn,
        None => device.open().await?,
    };

    if let Some(data) = data {
        conn.write(data).await?;
    }

    let status = conn.query_status().await?;
    if !status.is_ready() {
        return Err(PrintError::Offline(status.to_string()));
    }

    *slot = Some(conn);
    Ok(status)
}
