//! Barcode symbologies and QR error-correction levels understood by TSPL

use std::fmt;
use std::str::FromStr;

use crate::error::{PrintError, PrintResult};

/// Barcode symbology, named by its TSPL `BARCODE` code type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    /// Code 128, automatic subset switching
    Code128,
    /// Code 128, manual subset selection
    Code128M,
    /// GS1-128 (UCC/EAN-128)
    Ean128,
    /// Interleaved 2 of 5
    Interleaved25,
    /// Interleaved 2 of 5 with check digit
    Interleaved25C,
    /// Code 39 full ASCII
    Code39,
    /// Code 39 full ASCII with check digit
    Code39C,
    /// Code 93
    Code93,
    /// EAN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// Codabar
    Codabar,
    /// Postnet
    Postnet,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// MSI
    Msi,
    /// ITF-14
    Itf14,
    /// EAN-14
    Ean14,
}

impl Symbology {
    /// Every symbology with a TSPL code, in catalogue order
    pub const ALL: [Symbology; 17] = [
        Symbology::Code128,
        Symbology::Code128M,
        Symbology::Ean128,
        Symbology::Interleaved25,
        Symbology::Interleaved25C,
        Symbology::Code39,
        Symbology::Code39C,
        Symbology::Code93,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::Codabar,
        Symbology::Postnet,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Msi,
        Symbology::Itf14,
        Symbology::Ean14,
    ];

    /// Code type as written in the `BARCODE` command
    pub fn code(self) -> &'static str {
        match self {
            Symbology::Code128 => "128",
            Symbology::Code128M => "128M",
            Symbology::Ean128 => "EAN128",
            Symbology::Interleaved25 => "25",
            Symbology::Interleaved25C => "25C",
            Symbology::Code39 => "39",
            Symbology::Code39C => "39C",
            Symbology::Code93 => "93",
            Symbology::Ean13 => "EAN13",
            Symbology::Ean8 => "EAN8",
            Symbology::Codabar => "CODA",
            Symbology::Postnet => "POST",
            Symbology::UpcA => "UPCA",
            Symbology::UpcE => "UPCE",
            Symbology::Msi => "MSI",
            Symbology::Itf14 => "ITF14",
            Symbology::Ean14 => "EAN14",
        }
    }

    /// Check that `data` can be encoded by this symbology
    pub fn validate(self, data: &str) -> PrintResult<()> {
        let digits = !data.is_empty() && data.bytes().all(|b| b.is_ascii_digit());
        let ok = match self {
            Symbology::Code128 | Symbology::Code128M | Symbology::Ean128 | Symbology::Code93 => {
                !data.is_empty() && data.is_ascii()
            }
            Symbology::Code39 | Symbology::Code39C => {
                !data.is_empty()
                    && data.chars().all(|c| {
                        c.is_ascii_uppercase() || c.is_ascii_digit() || " -.$/+%".contains(c)
                    })
            }
            Symbology::Codabar => {
                !data.is_empty()
                    && data
                        .chars()
                        .all(|c| c.is_ascii_digit() || "-$:/.+ABCD".contains(c))
            }
            Symbology::Interleaved25 | Symbology::Interleaved25C | Symbology::Msi => digits,
            Symbology::Ean13 => digits && matches!(data.len(), 12 | 13),
            Symbology::Ean8 => digits && matches!(data.len(), 7 | 8),
            Symbology::UpcA => digits && matches!(data.len(), 11 | 12),
            Symbology::UpcE => digits && matches!(data.len(), 6..=8),
            Symbology::Itf14 | Symbology::Ean14 => digits && matches!(data.len(), 13 | 14),
            Symbology::Postnet => digits && matches!(data.len(), 5 | 9 | 11),
        };

        if ok {
            Ok(())
        } else {
            Err(PrintError::InvalidData(format!(
                "'{}' cannot be encoded as {}",
                data,
                self.code()
            )))
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Symbology {
    type Err = PrintError;

    /// Accepts the TSPL code type, case-insensitive (`"128"`, `"ean13"`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Symbology::ALL
            .iter()
            .copied()
            .find(|sym| sym.code() == wanted)
            .ok_or_else(|| PrintError::UnsupportedSymbology(s.to_string()))
    }
}

/// QR code error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrEcc {
    /// ~7% recovery
    L,
    /// ~15% recovery
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    #[default]
    H,
}

impl QrEcc {
    pub fn code(self) -> char {
        match self {
            QrEcc::L => 'L',
            QrEcc::M => 'M',
            QrEcc::Q => 'Q',
            QrEcc::H => 'H',
        }
    }
}
