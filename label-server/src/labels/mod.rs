//! 标签处理流水线
//!
//! 请求 → [`LayoutResolver`] → [`ElementRenderer`] → [`PrintJob`]
//!
//! - [`types`] - 标签数据模型和模板
//! - [`layout`] - 模板展开与校验
//! - [`renderer`] - 元素到 TSPL 绘图指令
//! - [`job`] - 打印任务构建与编码

pub mod job;
pub mod layout;
pub mod renderer;
pub mod types;

pub use job::{JobResult, PrintJob};
pub use layout::LayoutResolver;
pub use renderer::{ElementRenderer, FontCatalog, RenderedLabel};
pub use types::{
    CustomElement, CustomLayout, Element, ElementKind, Label, LabelSize, LayoutSource, Row,
    Template,
};
