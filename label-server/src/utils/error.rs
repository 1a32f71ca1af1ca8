//! 统一错误处理
//!
//! 提供应用级错误类型和错误响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`ErrorBody`] - 错误响应体
//!
//! # 错误分类
//!
//! | kind | HTTP 状态 | 说明 |
//! |------|-----------|------|
//! | validation_error | 400 | 请求或标签数据无效 |
//! | unsupported_symbology | 400 | 条码类型不支持 |
//! | font_not_found | 400 | 字体不存在 |
//! | device_busy | 429 | 打印队列已满 |
//! | device_unavailable | 503 | 打印机无法连接或报告故障 |
//! | timeout | 504 | 打印机未在时限内确认 |
//! | internal_error | 500 | 内部错误 |
//!
//! # 使用示例
//!
//! ```ignore
//! Err(AppError::validation("qty must be at least 1"))
//! ```

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use tspl_printer::PrintError;

/// 错误响应体
///
/// ```json
/// {
///   "detail": "single-text row 1: field 'text' is required",
///   "kind": "validation_error"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub kind: &'static str,
}

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 请求错误 (4xx) ==========
    #[error("{0}")]
    /// 验证失败 (400)
    Validation(String),

    #[error("Unsupported barcode symbology: {0}")]
    /// 条码类型不支持 (400)
    UnsupportedSymbology(String),

    #[error("Font not found: {0}")]
    /// 字体不存在 (400)，渲染时降级为默认字体
    FontNotFound(String),

    #[error("Printer busy: {0}")]
    /// 队列已满 (429)
    DeviceBusy(String),

    // ========== 设备错误 (5xx) ==========
    #[error("Printer unavailable: {0}")]
    /// 打印机不可用 (503)
    DeviceUnavailable(String),

    #[error("Printer timeout: {0}")]
    /// 打印超时 (504)
    Timeout(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 机器可读的错误类型
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::UnsupportedSymbology(_) => "unsupported_symbology",
            AppError::FontNotFound(_) => "font_not_found",
            AppError::DeviceBusy(_) => "device_busy",
            AppError::DeviceUnavailable(_) => "device_unavailable",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsupportedSymbology(_)
            | AppError::FontNotFound(_) => StatusCode::BAD_REQUEST,
            AppError::DeviceBusy(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            // Internal errors (500) - details stay in the log
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            detail,
            kind: self.kind(),
        });

        (status, body).into_response()
    }
}

impl From<PrintError> for AppError {
    fn from(e: PrintError) -> Self {
        match e {
            PrintError::Connection(_) | PrintError::Io(_) | PrintError::Offline(_) => {
                AppError::DeviceUnavailable(e.to_string())
            }
            PrintError::Timeout(msg) => AppError::Timeout(msg),
            PrintError::UnsupportedSymbology(code) => AppError::UnsupportedSymbology(code),
            PrintError::InvalidData(msg) => AppError::Validation(msg),
            PrintError::InvalidConfig(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Result type for handlers and the label pipeline
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DeviceBusy("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::DeviceUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Timeout("x".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_print_error() {
        let e: AppError = PrintError::Connection("refused".into()).into();
        assert_eq!(e.kind(), "device_unavailable");

        let e: AppError = PrintError::Offline("out of paper".into()).into();
        assert_eq!(e.kind(), "device_unavailable");

        let e: AppError = PrintError::Timeout("no status".into()).into();
        assert_eq!(e.kind(), "timeout");

        let e: AppError = PrintError::UnsupportedSymbology("PDF417".into()).into();
        assert!(matches!(e, AppError::UnsupportedSymbology(ref c) if c == "PDF417"));

        let e: AppError = PrintError::InvalidData("bad".into()).into();
        assert_eq!(e.kind(), "validation_error");
    }

    #[test]
    fn test_internal_detail_hidden() {
        let response = AppError::internal("secret path /etc/x").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
