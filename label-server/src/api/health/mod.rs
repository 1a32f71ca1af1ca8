//! 服务信息和健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | / | GET | 服务信息 |
//! | /health | GET | 健康检查 (不访问打印机) |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "alive",
//!   "service": "label-server",
//!   "version": "0.1.0",
//!   "uptime_seconds": 42,
//!   "printer": { "device": "tcp://192.168.1.100:9100", "state": "connected", "queued": 0, ... }
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::printing::ServiceStatus;

const SERVICE: &str = "label-server";

/// 公共路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// 服务信息响应
#[derive(Serialize)]
pub struct RootResponse {
    service: &'static str,
    version: &'static str,
    health: &'static str,
    endpoints: [&'static str; 4],
}

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    /// 进程存活即为 alive
    status: &'static str,
    service: &'static str,
    version: &'static str,
    /// 运行时间 (秒)
    uptime_seconds: u64,
    /// 打印机状态 (仅读取内存状态)
    printer: ServiceStatus,
}

/// GET / - 服务信息
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
        health: "/health",
        endpoints: ["/health", "/test", "/print", "/print/qrcode"],
    })
}

/// GET /health - 健康检查
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        printer: state.dispatcher.health_check(),
    })
}
