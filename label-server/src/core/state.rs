use std::sync::Arc;
use std::time::Instant;

use tspl_printer::{NetworkPrinter, PrinterDevice, UsbPrinter};

use crate::core::{Config, Result};
use crate::printing::{PrintDispatcher, PrintService};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求克隆一次。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Arc<Config> | 配置项 (不可变) |
/// | dispatcher | Arc<PrintDispatcher> | 打印机连接和排队 |
/// | print_service | Arc<PrintService> | 标签流水线 |
/// | started_at | Instant | 启动时间 (用于 uptime) |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<PrintDispatcher>,
    pub print_service: Arc<PrintService>,
    pub started_at: Instant,
}

impl ServerState {
    /// 使用指定的打印设备创建状态
    ///
    /// 测试中传入 mock 设备
    pub fn new(config: Config, device: Arc<dyn PrinterDevice>) -> Self {
        let dispatcher = Arc::new(PrintDispatcher::new(
            device,
            config.printer.max_queue_depth,
            config.printer.job_timeout(),
        ));
        let print_service = Arc::new(PrintService::new(&config, dispatcher.clone()));

        Self {
            config: Arc::new(config),
            dispatcher,
            print_service,
            started_at: Instant::now(),
        }
    }

    /// 根据配置创建打印设备并初始化状态
    ///
    /// `PRINTER_DEVICE` 设置时使用 USB 设备，否则使用网络打印机
    pub fn initialize(config: &Config) -> Result<Self> {
        config.validate()?;
        let device = printer_device(config)?;
        tracing::info!(device = %device.describe(), "Printer configured");
        Ok(Self::new(config.clone(), device))
    }

    /// 运行时间 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

fn printer_device(config: &Config) -> Result<Arc<dyn PrinterDevice>> {
    let printer = &config.printer;
    let device: Arc<dyn PrinterDevice> = match &printer.device {
        Some(path) => Arc::new(UsbPrinter::new(path)),
        None => Arc::new(
            NetworkPrinter::new(&printer.ip, printer.port)?
                .with_timeout(printer.connect_timeout()),
        ),
    };
    Ok(device)
}
