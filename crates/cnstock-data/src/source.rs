//! 数据源能力接口定义。
//!
//! 所有具体数据源（东方财富、自建数据库等）都实现 [`DataSource`]，
//! 聚合器只依赖这个接口。新增数据源无需改动聚合器。
//!
//! 财务摘要、资金流向、实时快照这几类表格的数值格式因数据源而异
//! （可能是数字、`"1.5亿"`、`"24.00%"`、`"-"` 等），所以行类型保留
//! 原始 [`serde_json::Value`]，统一的清洗放在聚合器一侧。

use async_trait::async_trait;
use serde_json::Value;

use cnstock_core::Market;

use crate::error::SourceResult;

/// 复权方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjust {
    /// 前复权
    #[default]
    Forward,
    /// 后复权
    Backward,
    /// 不复权
    None,
}

impl Adjust {
    /// 行情接口使用的复权代码。
    pub fn fqt(&self) -> u8 {
        match self {
            Self::Forward => 1,
            Self::Backward => 2,
            Self::None => 0,
        }
    }

    /// 中文显示名。
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward => "前复权",
            Self::Backward => "后复权",
            Self::None => "不复权",
        }
    }
}

impl std::str::FromStr for Adjust {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qfq" => Ok(Self::Forward),
            "hfq" => Ok(Self::Backward),
            "" | "none" => Ok(Self::None),
            _ => Err(format!("Unknown adjust mode: {}", s)),
        }
    }
}

/// 一根日K线。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyBar {
    /// 交易日，"YYYY-MM-DD"
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// 成交量
    pub volume: f64,
    /// 成交额（元）
    pub amount: f64,
    /// 振幅（百分点）
    pub amplitude: f64,
    /// 涨跌幅（百分点）
    pub change_pct: f64,
    /// 涨跌额
    pub change_amount: f64,
    /// 换手率（百分点）
    pub turnover_rate: f64,
}

/// 财务摘要的一个报告期。
///
/// 各字段保留数据源的原始标量，由聚合器统一清洗。
#[derive(Debug, Clone, Default)]
pub struct FinanceAbstractRow {
    /// 报告期
    pub report_date: Value,
    /// 营业总收入
    pub main_revenue: Value,
    /// 净利润
    pub net_profit: Value,
    /// 基本每股收益
    pub eps: Value,
    /// 每股净资产
    pub nav_per_share: Value,
    /// 净资产收益率
    pub roe: Value,
}

/// 资金流向表的一行（一个交易日）。
#[derive(Debug, Clone, Default)]
pub struct FundFlowRow {
    /// 交易日
    pub date: Value,
    /// 主力净额 / 净占比
    pub main_amount: Value,
    pub main_ratio: Value,
    /// 超大单净额 / 净占比
    pub extra_large_amount: Value,
    pub extra_large_ratio: Value,
    /// 大单净额 / 净占比
    pub large_amount: Value,
    pub large_ratio: Value,
    /// 中单净额 / 净占比
    pub medium_amount: Value,
    pub medium_ratio: Value,
    /// 小单净额 / 净占比
    pub small_amount: Value,
    pub small_ratio: Value,
}

/// 实时行情/估值快照。
#[derive(Debug, Clone, Default)]
pub struct SnapshotRow {
    /// 股票名称
    pub name: String,
    /// 最新价
    pub latest_price: Value,
    /// 总股本
    pub total_shares: Value,
    /// 流通股本
    pub float_shares: Value,
    /// 总市值
    pub total_market_cap: Value,
    /// 流通市值
    pub float_market_cap: Value,
    /// 市盈率（动）
    pub pe_ttm: Value,
}

/// 股票列表条目（数据源格式的代码）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// 六位数字代码
    pub code: String,
    /// 股票名称
    pub name: String,
}

/// 数据源能力接口。
///
/// 所有方法都可能因上游故障失败或返回空结果，调用方必须都能容忍。
#[async_trait]
pub trait DataSource: Send + Sync {
    /// 数据源名称。
    fn name(&self) -> &str;

    /// 获取日K线。
    ///
    /// # 参数
    /// * `code` - 六位数字代码
    /// * `market` - 市场
    /// * `start` / `end` - 日期范围，"YYYY-MM-DD"
    /// * `adjust` - 复权方式
    async fn fetch_daily_bars(
        &self,
        code: &str,
        market: Market,
        start: &str,
        end: &str,
        adjust: Adjust,
    ) -> SourceResult<Vec<DailyBar>>;

    /// 获取财务摘要（按报告期）。
    async fn fetch_financial_abstract(
        &self,
        code: &str,
        market: Market,
    ) -> SourceResult<Vec<FinanceAbstractRow>>;

    /// 获取资金流向表。
    async fn fetch_fund_flow(&self, code: &str, market: Market)
        -> SourceResult<Vec<FundFlowRow>>;

    /// 获取实时行情/估值快照。
    async fn fetch_snapshot(&self, code: &str, market: Market) -> SourceResult<SnapshotRow>;

    /// 获取所属板块。
    async fn fetch_sectors(&self, code: &str, market: Market) -> SourceResult<Vec<String>>;

    /// 获取某个交易所的股票列表。
    async fn fetch_symbol_list(&self, market: Market) -> SourceResult<Vec<SymbolEntry>>;
}
