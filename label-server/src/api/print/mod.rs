//! Print API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /print | POST | 按模板打印一批标签 |
//! | /print/qrcode | POST | 快速打印单个二维码标签 |

mod handler;

pub use handler::{PrintBody, PrintResponse, QrCodeBody};

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/print", post(handler::print))
        .route("/print/qrcode", post(handler::print_qrcode))
}
