//! Printer API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
pub struct TestResponse {
    status: &'static str,
    message: String,
    device: String,
    printer_status: String,
}

/// POST /test - 测试打印机连接
pub async fn test_connection(State(state): State<ServerState>) -> AppResult<Json<TestResponse>> {
    let result = state.dispatcher.test_connection().await?;

    Ok(Json(TestResponse {
        status: "ok",
        message: format!("Printer {} is reachable", result.device),
        device: result.device,
        printer_status: result.printer_status,
    }))
}
