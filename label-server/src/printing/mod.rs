//! 打印模块
//!
//! - [`dispatcher`] - 打印机连接管理、排队和超时
//! - [`service`] - 单次打印请求的流水线

pub mod dispatcher;
pub mod service;

pub use dispatcher::{ConnectionState, ConnectionStatus, PrintDispatcher, ServiceStatus};
pub use service::{PrintRequest, PrintService, QrCodeRequest};
