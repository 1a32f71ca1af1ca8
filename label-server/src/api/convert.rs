//! 请求字段转换
//!
//! 份数和超时的默认值与校验; 尺寸解析见 [`crate::labels::LabelSize::from_json`]

use std::time::Duration;

use crate::utils::{AppError, AppResult};

/// 打印份数，默认 1；上限由任务构建时校验
pub fn copies(qty: Option<i64>) -> AppResult<u32> {
    let qty = qty.unwrap_or(1);
    u32::try_from(qty).map_err(|_| {
        AppError::validation(format!("qty must be a positive integer, got {}", qty))
    })
}

/// 请求级超时 (毫秒)
pub fn timeout(timeout_ms: Option<u64>) -> AppResult<Option<Duration>> {
    match timeout_ms {
        Some(0) => Err(AppError::validation("timeout_ms must be greater than 0")),
        Some(ms) => Ok(Some(Duration::from_millis(ms))),
        None => Ok(None),
    }
}
