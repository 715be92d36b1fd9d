//! 数据源错误类型。

use thiserror::Error;

/// 数据源相关错误。
#[derive(Debug, Error)]
pub enum SourceError {
    /// 网络/连接错误
    #[error("Network error: {0}")]
    Network(String),

    /// 请求超时
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 接口返回错误码
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// 响应解析失败
    #[error("Parse error: {0}")]
    Parse(String),

    /// 接口返回空数据
    #[error("No data: {0}")]
    NoData(String),

    /// 无法识别的市场
    #[error("Unknown market for code: {0}")]
    UnknownMarket(String),
}

/// 数据源操作的 Result 类型。
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// 是否为可重试的瞬时错误。
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Network(_) | SourceError::Timeout(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_connect() {
            SourceError::Network(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<cnstock_core::CoreError> for SourceError {
    fn from(err: cnstock_core::CoreError) -> Self {
        SourceError::Parse(err.to_string())
    }
}
