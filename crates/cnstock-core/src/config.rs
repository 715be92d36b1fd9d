//! 应用配置。
//!
//! 配置面很小，全部来自环境变量（配合 `.env` 文件加载），
//! 每一项都有可用的默认值。

use serde::{Deserialize, Serialize};

/// 应用配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 客户端设置
    pub http: HttpConfig,
    /// 数据文件设置
    pub data: DataConfig,
    /// 日志设置
    pub logging: LoggingConfig,
}

/// HTTP 客户端设置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 可选的代理地址，如 "http://127.0.0.1:7890"
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            proxy: None,
        }
    }
}

/// 数据文件设置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// 板块映射配置文件路径
    pub sector_file: String,
    /// 可选的本地股票名称表路径
    pub symbol_file: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sector_file: "confs/stock_sector.json".to_string(),
            symbol_file: None,
        }
    }
}

/// 日志设置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别过滤（如 "info", "cnstock_data=debug"）
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从环境变量构建配置。
    ///
    /// 读取 `CNSTOCK_HTTP_TIMEOUT_SECS`、`CNSTOCK_HTTP_PROXY`、
    /// `CNSTOCK_SECTOR_FILE`、`CNSTOCK_SYMBOL_FILE` 和 `RUST_LOG`，
    /// 缺失或无法解析的项使用默认值。
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CNSTOCK_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                config.http.timeout_secs = secs;
            }
        }
        if let Ok(proxy) = std::env::var("CNSTOCK_HTTP_PROXY") {
            if !proxy.is_empty() {
                config.http.proxy = Some(proxy);
            }
        }
        if let Ok(path) = std::env::var("CNSTOCK_SECTOR_FILE") {
            config.data.sector_file = path;
        }
        if let Ok(path) = std::env::var("CNSTOCK_SYMBOL_FILE") {
            config.data.symbol_file = Some(path);
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.http.proxy.is_none());
        assert_eq!(config.data.sector_file, "confs/stock_sector.json");
        assert_eq!(config.logging.level, "info");
    }
}
