//! Printer API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /test | POST | 连接打印机并查询状态，不打印 |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/test", post(handler::test_connection))
}
