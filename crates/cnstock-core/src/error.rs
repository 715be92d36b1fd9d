//! 核心错误类型。

use thiserror::Error;

/// 核心层错误。
#[derive(Debug, Error)]
pub enum CoreError {
    /// 日期值无法解析
    #[error("Invalid date value: {0}")]
    InvalidDate(String),

    /// 股票代码无法解释
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// 核心层操作的 Result 类型。
pub type CoreResult<T> = Result<T, CoreError>;
