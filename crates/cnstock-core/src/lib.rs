//! A 股数据核心类型。
//!
//! 这个 crate 提供：
//! - 规范化的单票数据记录 (`StockRecord`) 及其导出映射
//! - 股票代码转换与品种判别 (`symbol`)
//! - 原始标量/日期清洗 (`value`)
//! - 应用配置 (`config`)

pub mod config;
pub mod error;
pub mod record;
pub mod symbol;
pub mod value;

pub use config::{AppConfig, DataConfig, HttpConfig, LoggingConfig};
pub use error::{CoreError, CoreResult};
pub use record::{FundFlowSnapshot, StockRecord, TierFlow};
pub use symbol::Market;
