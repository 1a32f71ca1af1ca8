//! Print API Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::convert;
use crate::core::ServerState;
use crate::labels::{CustomLayout, JobResult, LabelSize, LayoutSource, Row, Template};
use crate::printing::{PrintRequest, QrCodeRequest};
use crate::utils::{AppError, AppResult};

/// `/print` 请求体
///
/// 内置模板使用 `print_list`，`custom` 模板使用 `layout`
#[derive(Debug, Deserialize)]
pub struct PrintBody {
    pub template: String,
    pub print_list: Option<Vec<Row>>,
    pub layout: Option<CustomLayout>,
    pub qty: Option<i64>,
    pub width: Option<Value>,
    pub height: Option<Value>,
    pub timeout_ms: Option<u64>,
}

/// `/print/qrcode` 请求体
#[derive(Debug, Deserialize)]
pub struct QrCodeBody {
    pub content: String,
    pub text: Option<String>,
    pub qty: Option<i64>,
    pub width: Option<Value>,
    pub height: Option<Value>,
    pub qr_size: Option<u32>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrintResponse {
    pub status: String,
    pub message: String,
    pub job_id: Uuid,
    pub labels: usize,
    pub copies: u32,
    pub printer_status: String,
}

impl From<JobResult> for PrintResponse {
    fn from(result: JobResult) -> Self {
        Self {
            status: "ok".into(),
            message: format!(
                "Sent {} label(s) x {} to the printer",
                result.labels, result.copies
            ),
            job_id: result.job_id,
            labels: result.labels,
            copies: result.copies,
            printer_status: result.printer_status,
        }
    }
}

/// POST /print - 按模板打印
pub async fn print(
    State(state): State<ServerState>,
    payload: Result<Json<PrintBody>, JsonRejection>,
) -> AppResult<Json<PrintResponse>> {
    let Json(body) = payload?;

    let template: Template = body.template.parse()?;
    let source = match (body.print_list, body.layout) {
        (Some(rows), None) => LayoutSource::Rows(rows),
        (None, Some(layout)) => LayoutSource::Explicit(layout),
        (Some(_), Some(_)) => {
            return Err(AppError::validation(
                "send either 'print_list' or 'layout', not both",
            ));
        }
        (None, None) => {
            return Err(AppError::validation(match template {
                Template::Custom => "template 'custom' requires 'layout'",
                _ => "'print_list' is required",
            }));
        }
    };

    let request = PrintRequest {
        template,
        source,
        qty: convert::copies(body.qty)?,
        size: LabelSize::from_json(body.width.as_ref(), body.height.as_ref())?,
        timeout: convert::timeout(body.timeout_ms)?,
    };

    let result = state.print_service.print(request).await?;
    Ok(Json(result.into()))
}

/// POST /print/qrcode - 快速打印二维码标签
pub async fn print_qrcode(
    State(state): State<ServerState>,
    payload: Result<Json<QrCodeBody>, JsonRejection>,
) -> AppResult<Json<PrintResponse>> {
    let Json(body) = payload?;

    let request = QrCodeRequest {
        content: body.content,
        text: body.text,
        module_size: body.qr_size,
        qty: convert::copies(body.qty)?,
        size: LabelSize::from_json(body.width.as_ref(), body.height.as_ref())?,
        timeout: convert::timeout(body.timeout_ms)?,
    };

    let result = state.print_service.print_quick_qrcode(request).await?;
    Ok(Json(result.into()))
}
