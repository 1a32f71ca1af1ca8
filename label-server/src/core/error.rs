use thiserror::Error;
use tspl_printer::PrintError;

/// 服务器启动/运行错误 (HTTP 请求错误见 [`crate::utils::AppError`])
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("打印机配置错误: {0}")]
    Printer(#[from] PrintError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
