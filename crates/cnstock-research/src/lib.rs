//! 研究分析层。
//!
//! 这个 crate 消费拼装好的 [`cnstock_core::StockRecord`]，提供：
//! - 技术指标适配层 (`indicators`)：KDJ / MACD / RSI / 布林带，
//!   统一输出带预热期标记的序列
//! - 报告生成 (`report`)：基本数据、交易数据、技术指标、财务数据
//!   四个部分的结构化文本报告，以及K线表格渲染

pub mod indicators;
pub mod report;

pub use indicators::{
    BollParams, BollSeries, IndicatorEngine, IndicatorError, IndicatorResult, KdjParams,
    KdjSeries, MacdParams, MacdSeries, RsiParams,
};
pub use report::{
    build_stock_report, render_kline_daily, render_kline_range, ReportLevel, ReportOptions,
};
