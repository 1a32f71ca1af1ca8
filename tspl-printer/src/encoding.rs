//! Text encoding for TSPL string parameters
//!
//! TSPL commands are plain ASCII, only the quoted string parameters carry
//! user text. This module provides:
//! - Code page selection (`CODEPAGE` command value + byte encoding)
//! - Quoting of user text so it cannot break out of a command line

use std::fmt;
use std::str::FromStr;

use crate::error::PrintError;

/// Printer code page used for text and QR/barcode content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codepage {
    /// UTF-8 passthrough (`CODEPAGE UTF-8`)
    #[default]
    Utf8,
    /// Simplified Chinese double-byte (`CODEPAGE 936`), needed by the
    /// resident `TSS*.BF2` bitmap fonts
    Gbk,
}

impl Codepage {
    /// Value of the TSPL `CODEPAGE` command
    pub fn command_value(self) -> &'static str {
        match self {
            Codepage::Utf8 => "UTF-8",
            Codepage::Gbk => "936",
        }
    }

    /// Encode a string parameter for this code page
    ///
    /// Characters GBK cannot represent are replaced by the encoder.
    pub fn encode(self, s: &str) -> Vec<u8> {
        match self {
            Codepage::Utf8 => s.as_bytes().to_vec(),
            Codepage::Gbk => {
                let (cow, _, _) = encoding_rs::GBK.encode(s);
                cow.into_owned()
            }
        }
    }
}

impl fmt::Display for Codepage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_value())
    }
}

impl FromStr for Codepage {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Codepage::Utf8),
            "GBK" | "936" | "GB2312" => Ok(Codepage::Gbk),
            other => Err(PrintError::InvalidConfig(format!(
                "Unknown codepage: {}",
                other
            ))),
        }
    }
}

/// Escape a user string for use inside a TSPL double-quoted parameter
///
/// A literal `"` is written as `\["]`. Line breaks would terminate the
/// command, so CR/LF and other control characters become spaces.
pub fn escape_tspl(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\[\"]"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Quote and encode a string parameter: `"escaped content"`
pub fn quoted(s: &str, codepage: Codepage) -> Vec<u8> {
    let escaped = escape_tspl(s);
    let mut out = Vec::with_capacity(escaped.len() + 2);
    out.push(b'"');
    out.extend_from_slice(&codepage.encode(&escaped));
    out.push(b'"');
    out
}
