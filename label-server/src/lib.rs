//! Label Server - 标签模板渲染与打印任务服务
//!
//! # 架构概述
//!
//! 接收 HTTP 打印请求，按模板展开为标签，渲染为 TSPL 指令并发送到
//! TSC 系列标签打印机：
//!
//! ```text
//! 请求 → LayoutResolver → ElementRenderer → PrintJob → PrintDispatcher → 打印机
//! ```
//!
//! # 模块结构
//!
//! ```text
//! label-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── labels/        # 模板、布局、渲染、任务
//! ├── printing/      # 打印机调度和流水线服务
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod core;
pub mod labels;
pub mod printing;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use labels::{PrintJob, Template};
pub use printing::{PrintDispatcher, PrintService};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger_with_file};

/// 设置运行环境: 按配置初始化日志
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())
}

/// 打印启动横幅
pub fn print_banner(config: &Config) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "🏷️ Label Server"
    );
}
