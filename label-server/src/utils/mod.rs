//! 工具模块
//!
//! - [`error`] - 统一错误类型
//! - [`logger`] - 日志初始化

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ErrorBody};
