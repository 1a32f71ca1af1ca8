//! # tspl-printer
//!
//! TSPL label printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - TSPL command building
//! - Code page handling (UTF-8 / GBK) and string escaping
//! - Barcode symbology catalogue
//! - Network printing (TCP port 9100) and USB character devices
//! - Device status decoding
//!
//! Business logic (WHAT to print) stays in the service:
//! - Templates and layout → label-server
//!
//! ## Example
//!
//! ```ignore
//! use tspl_printer::{Codepage, DrawCommand, NetworkPrinter, PrinterDevice, QrEcc, TsplBuilder};
//!
//! let mut builder = TsplBuilder::new(Codepage::Utf8);
//! builder.size(100.0, 90.0);
//! builder.cls();
//! builder.draw(&DrawCommand::QrCode {
//!     x: 250, y: 150, ecc: QrEcc::H, cell_width: 8, rotation: 0,
//!     content: "https://example.com".into(),
//! });
//! builder.print(1, 1);
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! let mut conn = printer.open().await?;
//! conn.write(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod printer;
mod symbology;
mod tspl;

// Re-exports
pub use encoding::{Codepage, escape_tspl, quoted};
pub use error::{PrintError, PrintResult};
pub use printer::{
    DEFAULT_PORT, NetworkPrinter, PrinterConnection, PrinterDevice, PrinterStatus, UsbPrinter,
};
pub use symbology::{QrEcc, Symbology};
pub use tspl::{DrawCommand, TsplBuilder};
