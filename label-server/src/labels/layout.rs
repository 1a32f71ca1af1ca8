//! Layout Resolver
//!
//! Turns a template and its input (rows or an explicit layout) into fully
//! positioned [`Label`]s. Pure: no I/O, same input gives the same labels.

use serde_json::Value;

use super::types::{
    CustomElement, CustomLayout, Element, ElementKind, Label, LabelSize, LayoutSource, Row,
    Template,
};
use crate::core::config::LabelDefaults;
use crate::utils::{AppError, AppResult};

// === Built-in template positions (dots) ===

const SINGLE_TEXT: (u32, u32) = (30, 80);
const DOUBLE_TEXT_FIRST: (u32, u32) = (30, 80);
const DOUBLE_TEXT_SECOND: (u32, u32) = (30, 360);
const QR_TEXT: (u32, u32) = (250, 30);
const QR_CODE: (u32, u32) = (250, 150);
/// QR position when the quick QR label has no caption
const QR_CODE_ALONE: (u32, u32) = (250, 100);
const BARCODE_TEXT: (u32, u32) = (150, 30);
const BARCODE: (u32, u32) = (150, 150);

pub const DEFAULT_QR_MODULE: u32 = 8;
pub const DEFAULT_BARCODE_HEIGHT: u32 = 80;
const MAX_QR_MODULE: u32 = 10;

#[derive(Debug, Clone)]
pub struct LayoutResolver {
    defaults: LabelDefaults,
}

impl LayoutResolver {
    pub fn new(defaults: LabelDefaults) -> Self {
        Self { defaults }
    }

    /// Resolve a print request into labels
    ///
    /// Built-in templates produce one label per row; `custom` produces
    /// exactly one label from the explicit layout.
    pub fn resolve(
        &self,
        template: Template,
        source: LayoutSource,
        size: LabelSize,
    ) -> AppResult<Vec<Label>> {
        let labels = match (template, source) {
            (Template::Custom, LayoutSource::Explicit(layout)) => vec![self.custom(layout, size)?],
            (Template::Custom, LayoutSource::Rows(_)) => {
                return Err(AppError::validation(
                    "template 'custom' requires a 'layout', not 'print_list'",
                ));
            }
            (_, LayoutSource::Explicit(_)) => {
                return Err(AppError::validation(format!(
                    "template '{}' requires 'print_list', 'layout' is only valid for 'custom'",
                    template
                )));
            }
            (_, LayoutSource::Rows(rows)) => {
                if rows.is_empty() {
                    return Err(AppError::validation("'print_list' must not be empty"));
                }
                let (width_mm, height_mm) = self.label_size(size)?;
                rows.iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let elements = self.template_elements(template, row, i + 1)?;
                        Ok(Label {
                            width_mm,
                            height_mm,
                            elements,
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?
            }
        };

        for label in &labels {
            self.validate(label)?;
        }
        Ok(labels)
    }

    /// One QR label, captioned when `text` is given
    pub fn resolve_quick_qrcode(
        &self,
        content: &str,
        text: Option<&str>,
        module_size: Option<u32>,
        size: LabelSize,
    ) -> AppResult<Label> {
        let (width_mm, height_mm) = self.label_size(size)?;
        let content = non_blank(content)
            .ok_or_else(|| AppError::validation("field 'content' is required"))?;
        let module_size = module_size.unwrap_or(DEFAULT_QR_MODULE);

        let mut elements = Vec::with_capacity(2);
        let qr_at = match text.and_then(non_blank) {
            Some(caption) => {
                elements.push(self.text_at(QR_TEXT, caption));
                QR_CODE
            }
            None => QR_CODE_ALONE,
        };
        elements.push(Element {
            x: qr_at.0,
            y: qr_at.1,
            kind: ElementKind::QrCode {
                content,
                module_size,
            },
        });

        let label = Label {
            width_mm,
            height_mm,
            elements,
        };
        self.validate(&label)?;
        Ok(label)
    }

    fn template_elements(
        &self,
        template: Template,
        row: &Row,
        index: usize,
    ) -> AppResult<Vec<Element>> {
        let elements = match template {
            Template::SingleText => {
                let text = required(row, "text", template, index)?;
                vec![self.text_at(SINGLE_TEXT, text)]
            }
            Template::DoubleText => {
                let first = optional(row, "text1", index)?;
                let second = optional(row, "text2", index)?;
                if first.is_none() && second.is_none() {
                    return Err(AppError::validation(format!(
                        "row {}: template 'double-text' needs 'text1' or 'text2'",
                        index
                    )));
                }
                first
                    .map(|t| self.text_at(DOUBLE_TEXT_FIRST, t))
                    .into_iter()
                    .chain(second.map(|t| self.text_at(DOUBLE_TEXT_SECOND, t)))
                    .collect()
            }
            Template::QrcodeWithText => {
                let code = required(row, "qrcode", template, index)?;
                let text = required(row, "text", template, index)?;
                vec![
                    self.text_at(QR_TEXT, text),
                    Element {
                        x: QR_CODE.0,
                        y: QR_CODE.1,
                        kind: ElementKind::QrCode {
                            content: code,
                            module_size: DEFAULT_QR_MODULE,
                        },
                    },
                ]
            }
            Template::BarcodeWithText => {
                let code = required(row, "barcode", template, index)?;
                let text = required(row, "text", template, index)?;
                vec![
                    self.text_at(BARCODE_TEXT, text),
                    Element {
                        x: BARCODE.0,
                        y: BARCODE.1,
                        kind: ElementKind::Barcode {
                            content: code,
                            height: DEFAULT_BARCODE_HEIGHT,
                            symbology: self.defaults.default_symbology.clone(),
                            human_readable: true,
                        },
                    },
                ]
            }
            Template::Custom => {
                return Err(AppError::internal("custom template has no row pattern"));
            }
        };
        Ok(elements)
    }

    fn custom(&self, layout: CustomLayout, size: LabelSize) -> AppResult<Label> {
        // Layout-level size wins over the request-level one
        let own = layout.size()?;
        let (width_mm, height_mm) = self.label_size(LabelSize {
            width_mm: own.width_mm.or(size.width_mm),
            height_mm: own.height_mm.or(size.height_mm),
        })?;

        if layout.elements.is_empty() {
            return Err(AppError::validation("custom layout has no elements"));
        }

        let elements = layout
            .elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| self.custom_element(element, i + 1))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Label {
            width_mm,
            height_mm,
            elements,
        })
    }

    fn custom_element(&self, element: CustomElement, index: usize) -> AppResult<Element> {
        let (x, y, kind) = match element {
            CustomElement::Text {
                x,
                y,
                text,
                font_size,
                font_name,
            } => (
                x,
                y,
                ElementKind::Text {
                    content: text,
                    font_size: font_size.unwrap_or(self.defaults.default_font_size),
                    font: font_name.filter(|f| !f.trim().is_empty()),
                },
            ),
            CustomElement::Qrcode { x, y, content, size } => (
                x,
                y,
                ElementKind::QrCode {
                    content,
                    module_size: size.unwrap_or(DEFAULT_QR_MODULE),
                },
            ),
            CustomElement::Barcode {
                x,
                y,
                content,
                height,
                barcode_type,
                human_readable,
            } => (
                x,
                y,
                ElementKind::Barcode {
                    content,
                    height: height.unwrap_or(DEFAULT_BARCODE_HEIGHT),
                    symbology: barcode_type
                        .unwrap_or_else(|| self.defaults.default_symbology.clone()),
                    human_readable: human_readable.unwrap_or(true),
                },
            ),
        };

        let name = kind.name();
        let coord = |v: i64, axis: &str| {
            u32::try_from(v).map_err(|_| {
                AppError::validation(format!(
                    "element {} ({}): {} = {} is outside the label",
                    index, name, axis, v
                ))
            })
        };

        Ok(Element {
            x: coord(x, "x")?,
            y: coord(y, "y")?,
            kind,
        })
    }

    fn text_at(&self, (x, y): (u32, u32), content: String) -> Element {
        Element {
            x,
            y,
            kind: ElementKind::Text {
                content,
                font_size: self.defaults.default_font_size,
                font: None,
            },
        }
    }

    /// Apply defaults and check the size against the configured maxima
    fn label_size(&self, size: LabelSize) -> AppResult<(f64, f64)> {
        let width = size.width_mm.unwrap_or(self.defaults.width_mm);
        let height = size.height_mm.unwrap_or(self.defaults.height_mm);

        let check = |value: f64, max: f64, name: &str| {
            if value.is_finite() && value > 0.0 && value <= max {
                Ok(())
            } else {
                Err(AppError::validation(format!(
                    "label {} must be greater than 0 and at most {} mm, got {}",
                    name, max, value
                )))
            }
        };
        check(width, self.defaults.max_width_mm, "width")?;
        check(height, self.defaults.max_height_mm, "height")?;

        Ok((width, height))
    }

    /// Element invariants: bounds, non-blank content, sane sizes
    fn validate(&self, label: &Label) -> AppResult<()> {
        let width_dots = self.defaults.to_dots(label.width_mm);
        let height_dots = self.defaults.to_dots(label.height_mm);

        for (i, element) in label.elements.iter().enumerate() {
            let index = i + 1;
            let name = element.kind.name();

            if element.x >= width_dots || element.y >= height_dots {
                return Err(AppError::validation(format!(
                    "element {} ({}) at ({}, {}) is outside the {}x{} dot label",
                    index, name, element.x, element.y, width_dots, height_dots
                )));
            }

            if element.kind.content().trim().is_empty() {
                return Err(AppError::validation(format!(
                    "element {} ({}): content must not be empty",
                    index, name
                )));
            }

            match &element.kind {
                ElementKind::Text { font_size, .. } if *font_size == 0 => {
                    return Err(AppError::validation(format!(
                        "element {} (text): font_size must be greater than 0",
                        index
                    )));
                }
                ElementKind::QrCode { module_size, .. }
                    if !(1..=MAX_QR_MODULE).contains(module_size) =>
                {
                    return Err(AppError::validation(format!(
                        "element {} (qrcode): size must be between 1 and {}, got {}",
                        index, MAX_QR_MODULE, module_size
                    )));
                }
                ElementKind::Barcode { height, .. } if *height == 0 => {
                    return Err(AppError::validation(format!(
                        "element {} (barcode): height must be greater than 0",
                        index
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Trimmed-empty strings count as absent
fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn optional(row: &Row, field: &str, index: usize) -> AppResult<Option<String>> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_blank(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(_) => Err(AppError::validation(format!(
            "row {}: field '{}' must be a string",
            index, field
        ))),
    }
}

fn required(row: &Row, field: &str, template: Template, index: usize) -> AppResult<String> {
    optional(row, field, index)?.ok_or_else(|| {
        AppError::validation(format!(
            "row {}: field '{}' is required for template '{}'",
            index, field, template
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> LayoutResolver {
        LayoutResolver::new(LabelDefaults::default())
    }

    fn rows(value: Value) -> LayoutSource {
        LayoutSource::Rows(serde_json::from_value(value).unwrap())
    }

    fn texts(label: &Label) -> Vec<(u32, u32, &str)> {
        label
            .elements
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Text { content, .. } => Some((e.x, e.y, content.as_str())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_one_label_per_row() {
        let r = resolver();
        let cases = [
            (Template::SingleText, json!([{"text": "a"}, {"text": "b"}, {"text": "c"}])),
            (
                Template::DoubleText,
                json!([{"text1": "a"}, {"text2": "b"}, {"text1": "c", "text2": "d"}]),
            ),
            (
                Template::QrcodeWithText,
                json!([
                    {"qrcode": "1", "text": "a"},
                    {"qrcode": "2", "text": "b"},
                    {"qrcode": "3", "text": "c"}
                ]),
            ),
            (
                Template::BarcodeWithText,
                json!([
                    {"barcode": "1", "text": "a"},
                    {"barcode": "2", "text": "b"},
                    {"barcode": "3", "text": "c"}
                ]),
            ),
        ];

        for (template, data) in cases {
            let first = r.resolve(template, rows(data.clone()), LabelSize::default()).unwrap();
            let second = r.resolve(template, rows(data), LabelSize::default()).unwrap();
            assert_eq!(first.len(), 3, "{}", template);
            assert_eq!(first, second, "{} must be idempotent", template);
        }
    }

    #[test]
    fn test_single_text_position() {
        let labels = resolver()
            .resolve(Template::SingleText, rows(json!([{"text": "物料A"}])), LabelSize::default())
            .unwrap();
        assert_eq!(texts(&labels[0]), vec![(30, 80, "物料A")]);
        assert_eq!(labels[0].width_mm, 100.0);
        assert_eq!(labels[0].height_mm, 90.0);
    }

    #[test]
    fn test_single_text_empty() {
        let err = resolver()
            .resolve(Template::SingleText, rows(json!([{"text": ""}])), LabelSize::default())
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let err = resolver()
            .resolve(Template::SingleText, rows(json!([{"text": "ok"}, {}])), LabelSize::default())
            .unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_double_text_only_second() {
        let labels = resolver()
            .resolve(Template::DoubleText, rows(json!([{"text2": "Lot 42"}])), LabelSize::default())
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].elements.len(), 1);
        assert_eq!(texts(&labels[0]), vec![(30, 360, "Lot 42")]);
    }

    #[test]
    fn test_double_text_both() {
        let labels = resolver()
            .resolve(
                Template::DoubleText,
                rows(json!([{"text1": "Top", "text2": "Bottom"}])),
                LabelSize::default(),
            )
            .unwrap();
        assert_eq!(texts(&labels[0]), vec![(30, 80, "Top"), (30, 360, "Bottom")]);
    }

    #[test]
    fn test_double_text_none() {
        let err = resolver()
            .resolve(
                Template::DoubleText,
                rows(json!([{"text1": null, "text2": "  "}])),
                LabelSize::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_qrcode_with_text_order() {
        let labels = resolver()
            .resolve(
                Template::QrcodeWithText,
                rows(json!([{"qrcode": "https://example.com/1", "text": "Item 1"}])),
                LabelSize::default(),
            )
            .unwrap();
        let elements = &labels[0].elements;
        assert_eq!(elements.len(), 2);
        assert_eq!((elements[0].x, elements[0].y, elements[0].kind.name()), (250, 30, "text"));
        assert_eq!((elements[1].x, elements[1].y, elements[1].kind.name()), (250, 150, "qrcode"));
    }

    #[test]
    fn test_barcode_with_text_defaults() {
        let labels = resolver()
            .resolve(
                Template::BarcodeWithText,
                rows(json!([{"barcode": 1234567890u64, "text": "SKU"}])),
                LabelSize::default(),
            )
            .unwrap();
        let barcode = &labels[0].elements[1];
        assert_eq!((barcode.x, barcode.y), (150, 150));
        assert_eq!(
            barcode.kind,
            ElementKind::Barcode {
                content: "1234567890".into(),
                height: 80,
                symbology: "128".into(),
                human_readable: true,
            }
        );
    }

    #[test]
    fn test_template_source_mismatch() {
        let r = resolver();
        let err = r
            .resolve(Template::Custom, rows(json!([{"text": "a"}])), LabelSize::default())
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let layout = CustomLayout {
            elements: vec![],
            width: None,
            height: None,
        };
        let err = r
            .resolve(Template::SingleText, LayoutSource::Explicit(layout), LabelSize::default())
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let err = r
            .resolve(Template::SingleText, rows(json!([])), LabelSize::default())
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_size_override_and_bounds() {
        let r = resolver();
        let size = LabelSize {
            width_mm: Some(60.0),
            height_mm: Some(40.0),
        };
        let labels = r
            .resolve(Template::SingleText, rows(json!([{"text": "a"}])), size)
            .unwrap();
        assert_eq!((labels[0].width_mm, labels[0].height_mm), (60.0, 40.0));

        // text2 sits at y=360, a 40 mm label is 320 dots high
        let err = r
            .resolve(Template::DoubleText, rows(json!([{"text2": "b"}])), size)
            .unwrap_err();
        assert!(err.to_string().contains("outside"));

        for bad in [0.0, -5.0, 121.0, f64::NAN] {
            let size = LabelSize {
                width_mm: Some(bad),
                height_mm: None,
            };
            assert!(r.resolve(Template::SingleText, rows(json!([{"text": "a"}])), size).is_err());
        }
    }

    #[test]
    fn test_custom_layout() {
        let layout: CustomLayout = serde_json::from_value(json!({
            "elements": [
                {"type": "text", "x": 10, "y": 20, "text": "hello", "font_name": "宋体"},
                {"type": "qrcode", "x": 300, "y": 20, "content": "qr", "size": 4},
                {
                    "type": "barcode", "x": 10, "y": 200,
                    "content": "ABC123", "barcode_type": "39", "height": 60
                }
            ],
            "width": 50,
            "height": 40
        }))
        .unwrap();

        let labels = resolver()
            .resolve(Template::Custom, LayoutSource::Explicit(layout), LabelSize::default())
            .unwrap();
        assert_eq!(labels.len(), 1);
        let label = &labels[0];
        assert_eq!((label.width_mm, label.height_mm), (50.0, 40.0));
        assert_eq!(
            label.elements[0].kind,
            ElementKind::Text {
                content: "hello".into(),
                font_size: 24,
                font: Some("宋体".into()),
            }
        );
        assert_eq!(
            label.elements[1].kind,
            ElementKind::QrCode {
                content: "qr".into(),
                module_size: 4,
            }
        );
    }

    #[test]
    fn test_custom_out_of_bounds() {
        let r = resolver();
        for element in [
            json!({"type": "text", "x": 800, "y": 10, "text": "edge"}),
            json!({"type": "text", "x": 10, "y": 720, "text": "edge"}),
            json!({"type": "qrcode", "x": -1, "y": 10, "content": "neg"}),
        ] {
            let layout: CustomLayout =
                serde_json::from_value(json!({ "elements": [element] })).unwrap();
            let err = r
                .resolve(Template::Custom, LayoutSource::Explicit(layout), LabelSize::default())
                .unwrap_err();
            assert_eq!(err.kind(), "validation_error");
            assert!(err.to_string().contains("outside"), "{}", err);
        }
    }

    #[test]
    fn test_custom_element_limits() {
        let r = resolver();
        for element in [
            json!({"type": "qrcode", "x": 1, "y": 1, "content": "q", "size": 11}),
            json!({"type": "qrcode", "x": 1, "y": 1, "content": "q", "size": 0}),
            json!({"type": "text", "x": 1, "y": 1, "text": "t", "font_size": 0}),
            json!({"type": "barcode", "x": 1, "y": 1, "content": "1", "height": 0}),
            json!({"type": "text", "x": 1, "y": 1, "text": "   "}),
        ] {
            let layout: CustomLayout =
                serde_json::from_value(json!({ "elements": [element] })).unwrap();
            let result = r.resolve(
                Template::Custom,
                LayoutSource::Explicit(layout),
                LabelSize::default(),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_quick_qrcode() {
        let r = resolver();

        let label = r
            .resolve_quick_qrcode(
                "https://example.com",
                Some("Scan me"),
                None,
                LabelSize::default(),
            )
            .unwrap();
        assert_eq!(label.elements.len(), 2);
        assert_eq!((label.elements[1].x, label.elements[1].y), (250, 150));

        let label = r
            .resolve_quick_qrcode("https://example.com", Some(""), Some(5), LabelSize::default())
            .unwrap();
        assert_eq!(label.elements.len(), 1);
        assert_eq!((label.elements[0].x, label.elements[0].y), (250, 100));
        assert_eq!(
            label.elements[0].kind,
            ElementKind::QrCode {
                content: "https://example.com".into(),
                module_size: 5,
            }
        );

        assert!(r.resolve_quick_qrcode(" ", None, None, LabelSize::default()).is_err());
        assert!(r.resolve_quick_qrcode("x", None, Some(11), LabelSize::default()).is_err());
    }
}
