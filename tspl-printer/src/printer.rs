//! Printer adapters for sending TSPL data
//!
//! Supports:
//! - Network printers (raw TCP, port 9100)
//! - USB/parallel printers exposed as a character device (e.g. `/dev/usb/lp0`)
//!
//! A device is opened into a [`PrinterConnection`]; the caller owns the
//! connection and decides when to close it.

use crate::error::{PrintError, PrintResult};
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// TSPL immediate status query (`<ESC>!?`)
const STATUS_QUERY: [u8; 3] = [0x1B, b'!', b'?'];

/// Default raw printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Device status as reported by the `<ESC>!?` status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterStatus {
    raw: Option<u8>,
}

impl PrinterStatus {
    const HEAD_OPEN: u8 = 0x01;
    const PAPER_JAM: u8 = 0x02;
    const OUT_OF_PAPER: u8 = 0x04;
    const OUT_OF_RIBBON: u8 = 0x08;
    const PAUSED: u8 = 0x10;
    const PRINTING: u8 = 0x20;
    const COVER_OPEN: u8 = 0x40;
    const OTHER_ERROR: u8 = 0x80;

    /// Status decoded from the device's status byte
    pub fn from_byte(byte: u8) -> Self {
        Self { raw: Some(byte) }
    }

    /// Device accepted the data but does not report status
    pub fn unreported() -> Self {
        Self { raw: None }
    }

    /// Whether the device can take (more) data
    ///
    /// "Printing" is not a fault. A device that does not report status is
    /// assumed ready once the write went through.
    pub fn is_ready(&self) -> bool {
        match self.raw {
            Some(b) => b & !Self::PRINTING == 0,
            None => true,
        }
    }

    /// Human-readable list of reported conditions
    pub fn problems(&self) -> Vec<&'static str> {
        let Some(b) = self.raw else {
            return Vec::new();
        };
        [
            (Self::HEAD_OPEN, "head opened"),
            (Self::PAPER_JAM, "paper jam"),
            (Self::OUT_OF_PAPER, "out of paper"),
            (Self::OUT_OF_RIBBON, "out of ribbon"),
            (Self::PAUSED, "paused"),
            (Self::COVER_OPEN, "cover opened"),
            (Self::OTHER_ERROR, "other error"),
        ]
        .into_iter()
        .filter(|(bit, _)| b & bit != 0)
        .map(|(_, name)| name)
        .collect()
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw {
            None => f.write_str("unreported"),
            Some(b) if b & Self::PRINTING != 0 && self.is_ready() => f.write_str("printing"),
            Some(_) if self.is_ready() => f.write_str("ready"),
            Some(_) => f.write_str(&self.problems().join(", ")),
        }
    }
}

/// An open, exclusive link to a printer
#[async_trait]
pub trait PrinterConnection: Send {
    /// Send raw TSPL data
    async fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Round-trip a status query; used as the acknowledgement of a write
    async fn query_status(&mut self) -> PrintResult<PrinterStatus>;

    /// Close the link
    async fn close(&mut self) -> PrintResult<()>;
}

/// A printer that can be opened into a [`PrinterConnection`]
#[async_trait]
pub trait PrinterDevice: Send + Sync {
    /// Open a new connection to the device
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>>;

    /// Where the device lives, for logs and status responses
    fn describe(&self) -> String;
}

/// Network printer (TCP port 9100)
///
/// TSC and most other label printers accept raw TSPL on port 9100 and
/// answer `<ESC>!?` with a single status byte on the same socket.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let addr_str = format!("{}:{}", host, port);
        let addr = addr_str
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr_str)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connection and status-read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl PrinterDevice for NetworkPrinter {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
        info!("Connecting to printer");

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        // Small writes (status queries) must not wait for Nagle
        if let Err(e) = stream.set_nodelay(true) {
            warn!(error = %e, "Failed to set TCP_NODELAY");
        }

        info!("Connected");
        Ok(Box::new(NetworkConnection {
            stream,
            addr: self.addr,
            timeout: self.timeout,
        }))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

struct NetworkConnection {
    stream: TcpStream,
    addr: SocketAddr,
    timeout: Duration,
}

#[async_trait]
impl PrinterConnection for NetworkConnection {
    #[instrument(skip(self, data), fields(addr = %self.addr, data_len = data.len()))]
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        self.stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;
        self.stream.flush().await?;

        debug!("Sent {} bytes", data.len());
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn query_status(&mut self) -> PrintResult<PrinterStatus> {
        self.stream.write_all(&STATUS_QUERY).await?;
        self.stream.flush().await?;

        let mut byte = [0u8; 1];
        let read = tokio::time::timeout(self.timeout, self.stream.read(&mut byte))
            .await
            .map_err(|_| PrintError::Timeout(format!("No status from {}", self.addr)))??;

        if read == 0 {
            return Err(PrintError::Connection(format!(
                "{}: connection closed by printer",
                self.addr
            )));
        }

        let status = PrinterStatus::from_byte(byte[0]);
        debug!(status = %status, "Printer status");
        Ok(status)
    }

    async fn close(&mut self) -> PrintResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// USB / parallel printer exposed as a character device
///
/// Writes go straight to the device node. The kernel printer class driver
/// gives no reliable read-back channel, so the status is always
/// [`PrinterStatus::unreported`] and a completed flush is the acknowledgement.
#[derive(Debug, Clone)]
pub struct UsbPrinter {
    path: PathBuf,
}

impl UsbPrinter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl PrinterDevice for UsbPrinter {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.path.display(), e)))?;

        info!("Printer device opened");
        Ok(Box::new(UsbConnection { file }))
    }

    fn describe(&self) -> String {
        format!("usb://{}", self.path.display())
    }
}

struct UsbConnection {
    file: tokio::fs::File,
}

#[async_trait]
impl PrinterConnection for UsbConnection {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        self.file.write_all(data).await?;
        self.file.flush().await?;
        Ok(())
    }

    async fn query_status(&mut self) -> PrintResult<PrinterStatus> {
        self.file.flush().await?;
        Ok(PrinterStatus::unreported())
    }

    async fn close(&mut self) -> PrintResult<()> {
        self.file.flush().await?;
        Ok(())
    }
}
