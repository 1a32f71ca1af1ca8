//! TSPL command builder
//!
//! Provides a fluent API for building TSPL print data and the drawing
//! primitives a rendered label is made of.

use crate::encoding::{Codepage, quoted};
use crate::symbology::{QrEcc, Symbology};

/// Line terminator accepted by every TSPL firmware
const EOL: &[u8] = b"\r\n";

/// One drawing primitive on a label, in device dots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// `TEXT x,y,"font",rotation,x-mul,y-mul,"content"`
    Text {
        x: u32,
        y: u32,
        font: String,
        rotation: u16,
        x_mul: u32,
        y_mul: u32,
        content: String,
    },
    /// `QRCODE x,y,ecc,cell,A,rotation,"content"`
    QrCode {
        x: u32,
        y: u32,
        ecc: QrEcc,
        cell_width: u8,
        rotation: u16,
        content: String,
    },
    /// `BARCODE x,y,"type",height,hri,rotation,narrow,wide,"content"`
    Barcode {
        x: u32,
        y: u32,
        symbology: Symbology,
        height: u32,
        human_readable: bool,
        rotation: u16,
        narrow: u8,
        wide: u8,
        content: String,
    },
}

impl DrawCommand {
    /// Short element kind name, used in logs and assertions
    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::Text { .. } => "text",
            DrawCommand::QrCode { .. } => "qrcode",
            DrawCommand::Barcode { .. } => "barcode",
        }
    }
}

/// TSPL command builder
///
/// Builds TSPL byte sequences for label printers. Command keywords are
/// ASCII; quoted string parameters are encoded with the builder's code page.
pub struct TsplBuilder {
    buf: Vec<u8>,
    codepage: Codepage,
}

impl TsplBuilder {
    /// Create a new builder encoding string parameters with `codepage`
    pub fn new(codepage: Codepage) -> Self {
        Self {
            buf: Vec::with_capacity(1024),
            codepage,
        }
    }

    fn line(&mut self, command: &str) -> &mut Self {
        self.buf.extend_from_slice(command.as_bytes());
        self.buf.extend_from_slice(EOL);
        self
    }

    // === Media Setup ===

    /// Label size in millimetres
    pub fn size(&mut self, width_mm: f64, height_mm: f64) -> &mut Self {
        self.line(&format!("SIZE {} mm, {} mm", width_mm, height_mm))
    }

    /// Gap between labels and its offset, in millimetres
    pub fn gap(&mut self, gap_mm: f64, offset_mm: f64) -> &mut Self {
        self.line(&format!("GAP {} mm, {} mm", gap_mm, offset_mm))
    }

    /// Print speed in inches per second
    pub fn speed(&mut self, ips: u8) -> &mut Self {
        self.line(&format!("SPEED {}", ips))
    }

    /// Print darkness, 0-15
    pub fn density(&mut self, level: u8) -> &mut Self {
        self.line(&format!("DENSITY {}", level.min(15)))
    }

    /// Print direction, 0 or 1
    pub fn direction(&mut self, direction: u8) -> &mut Self {
        self.line(&format!("DIRECTION {}", direction.min(1)))
    }

    /// Reference point of the label origin, in dots
    pub fn reference(&mut self, x: u32, y: u32) -> &mut Self {
        self.line(&format!("REFERENCE {},{}", x, y))
    }

    /// Select the builder's code page on the device
    pub fn codepage_command(&mut self) -> &mut Self {
        let value = self.codepage.command_value();
        self.line(&format!("CODEPAGE {}", value))
    }

    /// Tear-off mode: feed the gap to the tear bar after printing
    pub fn tear(&mut self, on: bool) -> &mut Self {
        self.line(if on { "SET TEAR ON" } else { "SET TEAR OFF" })
    }

    /// Clear the image buffer
    pub fn cls(&mut self) -> &mut Self {
        self.line("CLS")
    }

    // === Drawing ===

    /// Append one drawing primitive
    pub fn draw(&mut self, command: &DrawCommand) -> &mut Self {
        match command {
            DrawCommand::Text {
                x,
                y,
                font,
                rotation,
                x_mul,
                y_mul,
                content,
            } => {
                let head = format!(
                    "TEXT {},{},\"{}\",{},{},{},",
                    x, y, font, rotation, x_mul, y_mul
                );
                self.with_string(&head, content)
            }
            DrawCommand::QrCode {
                x,
                y,
                ecc,
                cell_width,
                rotation,
                content,
            } => {
                let head = format!(
                    "QRCODE {},{},{},{},A,{},",
                    x,
                    y,
                    ecc.code(),
                    cell_width,
                    rotation
                );
                self.with_string(&head, content)
            }
            DrawCommand::Barcode {
                x,
                y,
                symbology,
                height,
                human_readable,
                rotation,
                narrow,
                wide,
                content,
            } => {
                let head = format!(
                    "BARCODE {},{},\"{}\",{},{},{},{},{},",
                    x,
                    y,
                    symbology.code(),
                    height,
                    u8::from(*human_readable),
                    rotation,
                    narrow,
                    wide
                );
                self.with_string(&head, content)
            }
        }
    }

    fn with_string(&mut self, head: &str, content: &str) -> &mut Self {
        self.buf.extend_from_slice(head.as_bytes());
        self.buf.extend_from_slice(&quoted(content, self.codepage));
        self.buf.extend_from_slice(EOL);
        self
    }

    // === Output ===

    /// Print the image buffer: `sets` label sets, `copies` copies of each
    pub fn print(&mut self, sets: u32, copies: u32) -> &mut Self {
        self.line(&format!("PRINT {},{}", sets, copies))
    }

    // === Build ===

    /// Build the final byte buffer
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for TsplBuilder {
    fn default() -> Self {
        Self::new(Codepage::Utf8)
    }
}
