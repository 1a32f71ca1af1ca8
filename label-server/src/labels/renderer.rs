//! Element Renderer
//!
//! Binds the abstract elements of a [`Label`] to concrete TSPL drawing
//! commands: font codes and multipliers, QR error correction, barcode
//! symbology and module widths. Positions pass through unchanged (dots in,
//! dots out).

use std::collections::HashMap;

use tracing::warn;
use tspl_printer::{DrawCommand, QrEcc, Symbology};

use super::types::{Element, ElementKind, Label};
use crate::core::config::LabelDefaults;
use crate::utils::{AppError, AppResult};

/// Font used when neither the configured default nor a request names a known font
pub const FALLBACK_FONT: &str = "TSS24.BF2";

const MAX_MULTIPLIER: u32 = 10;

/// How a TSPL font scales
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Resident bitmap font, scaled by an integer multiplier of its cell height
    Bitmap { cell_height: u32 },
    /// Scalable font (`"0"` or a downloaded `*.TTF`), sized in points
    Scalable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub code: String,
    pub kind: FontKind,
}

impl FontSpec {
    fn bitmap(code: &str, cell_height: u32) -> Self {
        Self {
            code: code.to_string(),
            kind: FontKind::Bitmap { cell_height },
        }
    }

    fn scalable(code: &str) -> Self {
        Self {
            code: code.to_string(),
            kind: FontKind::Scalable,
        }
    }

    /// x/y multiplier for a character height of `size_dots`
    pub fn multiplier(&self, size_dots: u32, dots_per_mm: u32) -> u32 {
        match self.kind {
            FontKind::Bitmap { cell_height } => {
                let ratio = f64::from(size_dots) / f64::from(cell_height.max(1));
                (ratio.round() as u32).clamp(1, MAX_MULTIPLIER)
            }
            FontKind::Scalable => {
                // dots -> mm -> points
                let mm = f64::from(size_dots) / f64::from(dots_per_mm.max(1));
                ((mm * 72.0 / 25.4).round() as u32).max(1)
            }
        }
    }
}

/// Font family → TSPL font lookup
///
/// Knows the printer's resident fonts, a few family aliases and any aliases
/// added through configuration. Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct FontCatalog {
    fonts: HashMap<String, FontSpec>,
    aliases: HashMap<String, String>,
    default: FontSpec,
}

impl FontCatalog {
    pub fn new(default_font: &str, extra_aliases: &[(String, String)]) -> Self {
        let fonts: HashMap<String, FontSpec> = [
            FontSpec::bitmap("1", 12),
            FontSpec::bitmap("2", 20),
            FontSpec::bitmap("3", 24),
            FontSpec::bitmap("4", 32),
            FontSpec::bitmap("5", 48),
            FontSpec::bitmap("6", 19),
            FontSpec::bitmap("7", 27),
            FontSpec::bitmap("8", 25),
            FontSpec::bitmap("TSS16.BF2", 16),
            FontSpec::bitmap("TSS24.BF2", 24),
            FontSpec::scalable("0"),
        ]
        .into_iter()
        .map(|spec| (spec.code.to_uppercase(), spec))
        .collect();

        let mut aliases: HashMap<String, String> = [
            ("宋体", FALLBACK_FONT),
            ("simsun", FALLBACK_FONT),
            ("songti", FALLBACK_FONT),
            ("default", FALLBACK_FONT),
        ]
        .into_iter()
        .map(|(family, code)| (family.to_lowercase(), code.to_string()))
        .collect();

        let mut catalog = Self {
            fonts,
            aliases: HashMap::new(),
            default: FontSpec::bitmap(FALLBACK_FONT, 24),
        };

        for (family, code) in extra_aliases {
            if catalog.resolve_code(code).is_some() {
                aliases.insert(family.to_lowercase(), code.clone());
            } else {
                warn!(family = %family, code = %code, "Ignoring font alias to unknown font");
            }
        }
        catalog.aliases = aliases;

        match catalog.lookup(default_font) {
            Ok(spec) => catalog.default = spec,
            Err(_) => warn!(
                font = %default_font,
                fallback = FALLBACK_FONT,
                "Configured default font not found"
            ),
        }

        catalog
    }

    pub fn default_font(&self) -> &FontSpec {
        &self.default
    }

    /// Resolve a family name or TSPL font code
    pub fn lookup(&self, family: &str) -> AppResult<FontSpec> {
        let key = family.trim();
        let code = self
            .aliases
            .get(&key.to_lowercase())
            .map(String::as_str)
            .unwrap_or(key);

        self.resolve_code(code)
            .ok_or_else(|| AppError::FontNotFound(family.to_string()))
    }

    fn resolve_code(&self, code: &str) -> Option<FontSpec> {
        let upper = code.trim().to_uppercase();
        if let Some(spec) = self.fonts.get(&upper) {
            return Some(spec.clone());
        }
        // Fonts downloaded to the printer are addressed by file name
        if upper.len() > ".TTF".len() && upper.ends_with(".TTF") {
            return Some(FontSpec::scalable(&upper));
        }
        None
    }
}

/// A label bound to TSPL drawing commands
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLabel {
    pub width_mm: f64,
    pub height_mm: f64,
    pub commands: Vec<DrawCommand>,
}

impl RenderedLabel {
    /// Number of commands of the given kind (`"text"`, `"qrcode"`, `"barcode"`)
    pub fn count(&self, kind: &str) -> usize {
        self.commands.iter().filter(|c| c.kind() == kind).count()
    }
}

#[derive(Debug, Clone)]
pub struct ElementRenderer {
    fonts: FontCatalog,
    dots_per_mm: u32,
    narrow: u8,
    wide: u8,
}

impl ElementRenderer {
    pub fn new(defaults: &LabelDefaults) -> Self {
        Self {
            fonts: FontCatalog::new(&defaults.default_font, &defaults.font_aliases),
            dots_per_mm: defaults.dots_per_mm,
            narrow: defaults.barcode_narrow,
            wide: defaults.barcode_wide,
        }
    }

    pub fn render(&self, label: &Label) -> AppResult<RenderedLabel> {
        let commands = label
            .elements
            .iter()
            .map(|element| self.render_element(element))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(RenderedLabel {
            width_mm: label.width_mm,
            height_mm: label.height_mm,
            commands,
        })
    }

    fn render_element(&self, element: &Element) -> AppResult<DrawCommand> {
        let (x, y) = (element.x, element.y);

        let command = match &element.kind {
            ElementKind::Text {
                content,
                font_size,
                font,
            } => {
                let spec = self.font_for(font.as_deref());
                let multiplier = spec.multiplier(*font_size, self.dots_per_mm);
                DrawCommand::Text {
                    x,
                    y,
                    font: spec.code,
                    rotation: 0,
                    x_mul: multiplier,
                    y_mul: multiplier,
                    content: content.clone(),
                }
            }
            ElementKind::QrCode {
                content,
                module_size,
            } => DrawCommand::QrCode {
                x,
                y,
                ecc: QrEcc::H,
                cell_width: (*module_size).clamp(1, 10) as u8,
                rotation: 0,
                content: content.clone(),
            },
            ElementKind::Barcode {
                content,
                height,
                symbology,
                human_readable,
            } => {
                let symbology: Symbology = symbology.parse()?;
                symbology.validate(content)?;
                DrawCommand::Barcode {
                    x,
                    y,
                    symbology,
                    height: *height,
                    human_readable: *human_readable,
                    rotation: 0,
                    narrow: self.narrow,
                    wide: self.wide,
                    content: content.clone(),
                }
            }
        };

        Ok(command)
    }

    /// Unknown fonts are not fatal: warn and use the default font
    fn font_for(&self, family: Option<&str>) -> FontSpec {
        let Some(family) = family else {
            return self.fonts.default_font().clone();
        };

        match self.fonts.lookup(family) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = %self.fonts.default_font().code,
                    "Font not found, using default font"
                );
                self.fonts.default_font().clone()
            }
        }
    }
}
