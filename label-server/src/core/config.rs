use std::str::FromStr;
use std::time::Duration;

use tspl_printer::Codepage;

use crate::core::{Result, ServerError};

/// 服务器配置 - 标签打印服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (启动时先加载 `.env`)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_HOST | 0.0.0.0 | 监听地址 |
/// | HTTP_PORT | 8000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | PRINTER_IP | 192.168.1.100 | 网络打印机地址 |
/// | PRINTER_PORT | 9100 | 网络打印机端口 |
/// | PRINTER_DEVICE | (未设置) | USB 设备路径，设置后优先于网络打印机 |
/// | CONNECT_TIMEOUT_MS | 5000 | 连接超时(毫秒) |
/// | JOB_TIMEOUT_MS | 10000 | 打印任务默认超时(毫秒) |
/// | MAX_QUEUE_DEPTH | 16 | 排队上限，超出返回 busy |
/// | CONNECT_ON_STARTUP | false | 启动时立即连接打印机 |
/// | LABEL_WIDTH_MM / LABEL_HEIGHT_MM | 100 / 90 | 默认标签尺寸 |
/// | MAX_LABEL_WIDTH_MM / MAX_LABEL_HEIGHT_MM | 120 / 500 | 标签尺寸上限 |
/// | DOTS_PER_MM | 8 | 打印分辨率 (8 = 203 dpi) |
/// | LABEL_GAP_MM | 2 | 标签间隙 |
/// | PRINT_SPEED / PRINT_DENSITY | 4 / 10 | 打印速度 / 浓度 |
/// | CODEPAGE | UTF-8 | 字符编码 (UTF-8 / GBK) |
/// | DEFAULT_FONT | TSS24.BF2 | 默认字体 |
/// | DEFAULT_FONT_SIZE | 24 | 默认字号 (dots) |
/// | FONT_ALIASES | (未设置) | 字体别名 `family=CODE;family=CODE` |
/// | DEFAULT_SYMBOLOGY | 128 | 默认条码类型 |
/// | MAX_COPIES | 100 | 单次打印份数上限 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志格式 |
/// | LOG_DIR | (未设置) | 日志文件目录 (按天滚动) |
///
/// # 示例
///
/// ```ignore
/// PRINTER_IP=10.0.0.20 HTTP_PORT=8080 cargo run -p label-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP 监听地址
    pub http_host: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,

    /// 打印机连接配置
    pub printer: PrinterSettings,
    /// 标签默认值与约束
    pub labels: LabelDefaults,
    /// 介质设置 (每个任务头部发送一次)
    pub media: MediaSettings,

    // === 日志 ===
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

/// 打印机连接配置
#[derive(Debug, Clone)]
pub struct PrinterSettings {
    pub ip: String,
    pub port: u16,
    /// USB 字符设备路径 (如 `/dev/usb/lp0`)
    pub device: Option<String>,
    pub connect_timeout_ms: u64,
    pub job_timeout_ms: u64,
    pub max_queue_depth: usize,
    pub connect_on_startup: bool,
}

impl PrinterSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

/// 标签默认值与约束
#[derive(Debug, Clone)]
pub struct LabelDefaults {
    pub width_mm: f64,
    pub height_mm: f64,
    pub max_width_mm: f64,
    pub max_height_mm: f64,
    pub dots_per_mm: u32,
    pub default_font: String,
    pub default_font_size: u32,
    /// 额外的字体别名 (family, TSPL 字体代码)
    pub font_aliases: Vec<(String, String)>,
    pub default_symbology: String,
    pub max_copies: u32,
    /// 条码窄条 / 宽条宽度 (dots)
    pub barcode_narrow: u8,
    pub barcode_wide: u8,
}

impl LabelDefaults {
    /// 毫米转换为 dots
    pub fn to_dots(&self, mm: f64) -> u32 {
        (mm * f64::from(self.dots_per_mm)).round() as u32
    }
}

impl Default for LabelDefaults {
    fn default() -> Self {
        Self {
            width_mm: 100.0,
            height_mm: 90.0,
            max_width_mm: 120.0,
            max_height_mm: 500.0,
            dots_per_mm: 8,
            default_font: "TSS24.BF2".into(),
            default_font_size: 24,
            font_aliases: Vec::new(),
            default_symbology: "128".into(),
            max_copies: 100,
            barcode_narrow: 2,
            barcode_wide: 2,
        }
    }
}

/// 介质设置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaSettings {
    pub gap_mm: f64,
    pub speed: u8,
    pub density: u8,
    pub direction: u8,
    pub codepage: Codepage,
    pub tear: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            gap_mm: 2.0,
            speed: 4,
            density: 10,
            direction: 1,
            codepage: Codepage::Utf8,
            tear: true,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// 解析 `family=CODE;family=CODE` 格式的字体别名
///
/// 无效的条目会被忽略
pub fn parse_font_aliases(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (family, code) = pair.split_once('=')?;
            let (family, code) = (family.trim(), code.trim());
            if family.is_empty() || code.is_empty() {
                None
            } else {
                Some((family.to_string(), code.to_string()))
            }
        })
        .collect()
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let labels = LabelDefaults::default();
        let media = MediaSettings::default();

        Self {
            http_host: env_string("HTTP_HOST", "0.0.0.0"),
            http_port: env_or("HTTP_PORT", 8000),
            environment: env_string("ENVIRONMENT", "development"),

            printer: PrinterSettings {
                ip: env_string("PRINTER_IP", "192.168.1.100"),
                port: env_or("PRINTER_PORT", tspl_printer::DEFAULT_PORT),
                device: env_opt("PRINTER_DEVICE"),
                connect_timeout_ms: env_or("CONNECT_TIMEOUT_MS", 5000),
                job_timeout_ms: env_or("JOB_TIMEOUT_MS", 10000),
                max_queue_depth: env_or("MAX_QUEUE_DEPTH", 16),
                connect_on_startup: env_or("CONNECT_ON_STARTUP", false),
            },

            labels: LabelDefaults {
                width_mm: env_or("LABEL_WIDTH_MM", labels.width_mm),
                height_mm: env_or("LABEL_HEIGHT_MM", labels.height_mm),
                max_width_mm: env_or("MAX_LABEL_WIDTH_MM", labels.max_width_mm),
                max_height_mm: env_or("MAX_LABEL_HEIGHT_MM", labels.max_height_mm),
                dots_per_mm: env_or("DOTS_PER_MM", labels.dots_per_mm).max(1),
                default_font: env_string("DEFAULT_FONT", &labels.default_font),
                default_font_size: env_or("DEFAULT_FONT_SIZE", labels.default_font_size),
                font_aliases: env_opt("FONT_ALIASES")
                    .map(|raw| parse_font_aliases(&raw))
                    .unwrap_or_default(),
                default_symbology: env_string("DEFAULT_SYMBOLOGY", &labels.default_symbology),
                max_copies: env_or("MAX_COPIES", labels.max_copies),
                barcode_narrow: labels.barcode_narrow,
                barcode_wide: labels.barcode_wide,
            },

            media: MediaSettings {
                gap_mm: env_or("LABEL_GAP_MM", media.gap_mm),
                speed: env_or("PRINT_SPEED", media.speed),
                density: env_or("PRINT_DENSITY", media.density),
                codepage: env_or("CODEPAGE", media.codepage),
                ..media
            },

            log_level: env_string("LOG_LEVEL", "info"),
            log_json: env_or("LOG_JSON", false),
            log_dir: env_opt("LOG_DIR"),
        }
    }

    /// HTTP 监听地址 (host:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// 启动前检查配置
    ///
    /// 份数上限、默认字号、任务超时为 0 或默认尺寸越界时返回 [`ServerError::Config`]
    pub fn validate(&self) -> Result<()> {
        let labels = &self.labels;

        if labels.max_copies == 0 {
            return Err(ServerError::Config("MAX_COPIES must be at least 1".into()));
        }
        if labels.default_font_size == 0 {
            return Err(ServerError::Config(
                "DEFAULT_FONT_SIZE must be at least 1".into(),
            ));
        }
        if self.printer.job_timeout_ms == 0 {
            return Err(ServerError::Config("JOB_TIMEOUT_MS must be at least 1".into()));
        }
        for (name, value, max) in [
            ("LABEL_WIDTH_MM", labels.width_mm, labels.max_width_mm),
            ("LABEL_HEIGHT_MM", labels.height_mm, labels.max_height_mm),
        ] {
            if !value.is_finite() || value <= 0.0 || value > max {
                return Err(ServerError::Config(format!(
                    "{} must be in (0, {}], got {}",
                    name, max, value
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_font_aliases() {
        let aliases = parse_font_aliases("黑体=TSS24.BF2; mono = 3 ;broken;=X;empty=");
        assert_eq!(
            aliases,
            vec![
                ("黑体".to_string(), "TSS24.BF2".to_string()),
                ("mono".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_dots() {
        let labels = LabelDefaults::default();
        assert_eq!(labels.to_dots(100.0), 800);
        assert_eq!(labels.to_dots(90.0), 720);
        assert_eq!(labels.to_dots(57.5), 460);
    }

    #[test]
    fn test_defaults() {
        let labels = LabelDefaults::default();
        assert_eq!(labels.max_copies, 100);
        assert_eq!(labels.default_symbology, "128");

        let media = MediaSettings::default();
        assert_eq!(media.codepage, Codepage::Utf8);
        assert_eq!(media.speed, 4);
        assert_eq!(media.density, 10);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.labels = LabelDefaults::default();
        config.printer.job_timeout_ms = 10000;
        assert!(config.validate().is_ok());

        let mut zero_copies = config.clone();
        zero_copies.labels.max_copies = 0;
        let err = zero_copies.validate().unwrap_err();
        assert!(matches!(err, ServerError::Config(ref m) if m.contains("MAX_COPIES")));

        let mut zero_font = config.clone();
        zero_font.labels.default_font_size = 0;
        assert!(zero_font.validate().is_err());

        let mut wide = config.clone();
        wide.labels.width_mm = 130.0;
        let err = wide.validate().unwrap_err();
        assert!(err.to_string().contains("LABEL_WIDTH_MM"));

        let mut no_timeout = config;
        no_timeout.printer.job_timeout_ms = 0;
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_timeouts() {
        let printer = PrinterSettings {
            ip: "127.0.0.1".into(),
            port: 9100,
            device: None,
            connect_timeout_ms: 1500,
            job_timeout_ms: 250,
            max_queue_depth: 4,
            connect_on_startup: false,
        };
        assert_eq!(printer.connect_timeout(), Duration::from_millis(1500));
        assert_eq!(printer.job_timeout(), Duration::from_millis(250));
    }
}
