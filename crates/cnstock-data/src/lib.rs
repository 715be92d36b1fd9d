//! 数据获取层。
//!
//! 这个 crate 提供：
//! - 数据源能力接口 [`DataSource`]（可插拔，方便切换行情提供商）
//! - 东方财富行情接口的具体实现 (`provider::eastmoney`)
//! - 把各类子数据拼装成 [`cnstock_core::StockRecord`] 的聚合器
//! - 本地板块映射与股票名称表

pub mod aggregator;
pub mod directory;
pub mod error;
pub mod provider;
pub mod sector;
pub mod source;

pub use aggregator::{StockDataAggregator, SymbolListing};
pub use directory::SymbolDirectory;
pub use error::{SourceError, SourceResult};
pub use provider::eastmoney::EastmoneyClient;
pub use sector::SectorMap;
pub use source::{
    Adjust, DailyBar, DataSource, FinanceAbstractRow, FundFlowRow, SnapshotRow, SymbolEntry,
};
