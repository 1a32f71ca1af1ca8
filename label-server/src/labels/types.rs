//! Label data model
//!
//! Labels are described in device dots relative to the top-left corner of the
//! label (x to the right, y downwards). Sizes are in millimetres.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{AppError, AppResult};

/// Built-in label templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// `text` in one line
    SingleText,
    /// `text1` and/or `text2` on two lines
    DoubleText,
    /// `text` above a QR code of `qrcode`
    QrcodeWithText,
    /// `text` above a barcode of `barcode`
    BarcodeWithText,
    /// Client-supplied element list
    Custom,
}

impl Template {
    pub const ALL: [Template; 5] = [
        Template::SingleText,
        Template::DoubleText,
        Template::QrcodeWithText,
        Template::BarcodeWithText,
        Template::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Template::SingleText => "single-text",
            Template::DoubleText => "double-text",
            Template::QrcodeWithText => "qrcode-with-text",
            Template::BarcodeWithText => "barcode-with-text",
            Template::Custom => "custom",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Template::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Template::ALL.iter().map(|t| t.name()).collect();
                AppError::validation(format!(
                    "Unknown template '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// One row of template data: field name → value
///
/// Values may be strings, numbers or null; null and blank strings count as
/// absent.
pub type Row = BTreeMap<String, Value>;

/// A label ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub width_mm: f64,
    pub height_mm: f64,
    pub elements: Vec<Element>,
}

/// A positioned element, coordinates in dots
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub x: u32,
    pub y: u32,
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text {
        content: String,
        /// Character height in dots
        font_size: u32,
        /// Font family or TSPL font code; `None` selects the default font
        font: Option<String>,
    },
    QrCode {
        content: String,
        /// Module (cell) width, 1-10
        module_size: u32,
    },
    Barcode {
        content: String,
        /// Bar height in dots
        height: u32,
        /// TSPL symbology code, e.g. `"128"`
        symbology: String,
        human_readable: bool,
    },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "text",
            ElementKind::QrCode { .. } => "qrcode",
            ElementKind::Barcode { .. } => "barcode",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ElementKind::Text { content, .. }
            | ElementKind::QrCode { content, .. }
            | ElementKind::Barcode { content, .. } => content,
        }
    }
}

/// Optional request-level label size override, in millimetres
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LabelSize {
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
}

impl LabelSize {
    /// Parse `width` / `height` as sent by clients (numbers or numeric strings)
    pub fn from_json(width: Option<&Value>, height: Option<&Value>) -> AppResult<Self> {
        Ok(Self {
            width_mm: millimetres(width, "width")?,
            height_mm: millimetres(height, "height")?,
        })
    }
}

/// Millimetres given as a number or a numeric string; null and blank are absent
fn millimetres(value: Option<&Value>, field: &str) -> AppResult<Option<f64>> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    parsed.filter(|v| v.is_finite()).map(Some).ok_or_else(|| {
        AppError::validation(format!("'{}' must be a number of millimetres", field))
    })
}

/// Explicit layout for the `custom` template
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomLayout {
    pub elements: Vec<CustomElement>,
    #[serde(default)]
    pub width: Option<Value>,
    #[serde(default)]
    pub height: Option<Value>,
}

impl CustomLayout {
    /// Layout-level size, parsed like the request-level one
    pub fn size(&self) -> AppResult<LabelSize> {
        Ok(LabelSize {
            width_mm: millimetres(self.width.as_ref(), "layout.width")?,
            height_mm: millimetres(self.height.as_ref(), "layout.height")?,
        })
    }
}

/// Custom layout element as sent by clients
///
/// Coordinates are signed so that negative values reach validation instead
/// of failing JSON parsing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CustomElement {
    Text {
        x: i64,
        y: i64,
        text: String,
        font_size: Option<u32>,
        font_name: Option<String>,
    },
    Qrcode {
        x: i64,
        y: i64,
        content: String,
        size: Option<u32>,
    },
    Barcode {
        x: i64,
        y: i64,
        content: String,
        height: Option<u32>,
        barcode_type: Option<String>,
        human_readable: Option<bool>,
    },
}

/// Where the elements of a print request come from
#[derive(Debug, Clone)]
pub enum LayoutSource {
    /// One label per row, built from a template pattern
    Rows(Vec<Row>),
    /// A single explicit label
    Explicit(CustomLayout),
}
