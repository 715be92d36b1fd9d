//! 规范化的单票数据记录。
//!
//! 不同数据源返回的表格最终都汇聚成一个 [`StockRecord`]，
//! 上层的分析与报告代码只依赖这个统一格式，不感知具体数据源。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 单一档位的资金流向快照（仅最新一个观测）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierFlow {
    /// 净额（元），缺失时为 None
    pub amount: Option<f64>,
    /// 净占比（百分点），缺失时为 None
    pub ratio: Option<f64>,
}

impl TierFlow {
    /// 净额与占比是否都已知。
    pub fn is_complete(&self) -> bool {
        self.amount.is_some() && self.ratio.is_some()
    }
}

/// 五档资金流向快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FundFlowSnapshot {
    /// 主力
    pub main: TierFlow,
    /// 超大单
    pub extra_large: TierFlow,
    /// 大单
    pub large: TierFlow,
    /// 中单
    pub medium: TierFlow,
    /// 小单
    pub small: TierFlow,
}

/// 股票数据统一记录。
///
/// 日线各数组等长（长度 `n`，按日期升序）；财务各数组等长（长度 `m`，
/// 与日线相互独立）；快照标量用 `Option` 表达"未知/已知"。
/// 记录是否为空只由日线历史决定：`n == 0` 即为空。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockRecord {
    /// 规范代码，如 "SH600000"
    pub symbol: String,
    /// 股票名称，可能为空
    pub name: String,

    // K线数据（日期为纳秒时间戳）
    pub date: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub amount: Vec<f64>,

    /// 不复权收盘价，与 `close` 等长
    pub close_unadj: Vec<f64>,
    /// 每股派息，与 `close` 等长，默认 0
    pub given_cash: Vec<f64>,
    /// 每股送转，与 `close` 等长，默认 0
    pub given_share: Vec<f64>,

    // 财务数据（报告期为纳秒时间戳，升序）
    pub finance_date: Vec<i64>,
    /// 主营收入（元）
    pub main_revenue: Vec<f64>,
    /// 净利润（元）
    pub net_profit: Vec<f64>,
    /// 每股收益
    pub eps: Vec<f64>,
    /// 每股净资产
    pub nav_per_share: Vec<f64>,
    /// 净资产收益率（百分点）
    pub roe: Vec<f64>,

    // 最新快照标量
    /// 总股本
    pub total_shares: Option<f64>,
    /// 总市值（元）
    pub total_market_cap: Option<f64>,
    /// 流通市值（元）
    pub float_market_cap: Option<f64>,
    /// 流通股本
    pub float_shares: Option<f64>,
    /// 市盈率（动）
    pub pe_ttm: Option<f64>,

    /// 资金流向快照
    pub fund_flow: FundFlowSnapshot,

    /// 行业概念板块，保留插入顺序，允许重复
    pub sectors: Vec<String>,
}

impl StockRecord {
    /// 创建空记录。
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// 日线条数。
    pub fn len(&self) -> usize {
        self.date.len()
    }

    /// 记录是否为空（没有日线历史即为空，与财务/资金流向无关）。
    pub fn is_empty(&self) -> bool {
        self.date.is_empty()
    }

    /// 财务报告期条数。
    pub fn finance_len(&self) -> usize {
        self.finance_date.len()
    }

    /// 转换为兼容旧接口的导出映射。
    ///
    /// 键名是下游消费方依赖的稳定约定，不可改动。
    /// `CLOSE2` 与 `PRICE` 都指向不复权收盘价；
    /// `_DS_FINANCE` 仅在财务序列非空时出现，值为 `[子映射, "1q"]`。
    pub fn to_export(&self) -> Map<String, Value> {
        let mut result = Map::new();

        result.insert("NAME".into(), Value::String(self.name.clone()));

        result.insert("DATE".into(), ns_series(&self.date));
        result.insert("OPEN".into(), f64_series(&self.open));
        result.insert("HIGH".into(), f64_series(&self.high));
        result.insert("LOW".into(), f64_series(&self.low));
        result.insert("CLOSE".into(), f64_series(&self.close));
        result.insert("VOLUME".into(), f64_series(&self.volume));
        result.insert("AMOUNT".into(), f64_series(&self.amount));
        result.insert("CLOSE2".into(), f64_series(&self.close_unadj));
        result.insert("PRICE".into(), f64_series(&self.close_unadj));

        result.insert("GCASH".into(), f64_series(&self.given_cash));
        result.insert("GSHARE".into(), f64_series(&self.given_share));

        result.insert("TCAP".into(), scalar_series(self.total_shares));
        result.insert("MR".into(), f64_series(&self.main_revenue));
        result.insert("NP".into(), f64_series(&self.net_profit));
        result.insert("EPS".into(), f64_series(&self.eps));
        result.insert("NAVPS".into(), f64_series(&self.nav_per_share));
        result.insert("ROE".into(), f64_series(&self.roe));

        result.insert("A_A".into(), scalar_series(self.fund_flow.main.amount));
        result.insert("A_R".into(), scalar_series(self.fund_flow.main.ratio));
        result.insert("XL_A".into(), scalar_series(self.fund_flow.extra_large.amount));
        result.insert("XL_R".into(), scalar_series(self.fund_flow.extra_large.ratio));
        result.insert("L_A".into(), scalar_series(self.fund_flow.large.amount));
        result.insert("L_R".into(), scalar_series(self.fund_flow.large.ratio));
        result.insert("M_A".into(), scalar_series(self.fund_flow.medium.amount));
        result.insert("M_R".into(), scalar_series(self.fund_flow.medium.ratio));
        result.insert("S_A".into(), scalar_series(self.fund_flow.small.amount));
        result.insert("S_R".into(), scalar_series(self.fund_flow.small.ratio));

        result.insert(
            "SECTOR".into(),
            Value::Array(self.sectors.iter().cloned().map(Value::String).collect()),
        );

        if !self.finance_date.is_empty() {
            let mut fin = Map::new();
            fin.insert("DATE".into(), ns_series(&self.finance_date));
            fin.insert("MR".into(), f64_series(&self.main_revenue));
            fin.insert("NP".into(), f64_series(&self.net_profit));
            fin.insert("EPS".into(), f64_series(&self.eps));
            fin.insert("NAVPS".into(), f64_series(&self.nav_per_share));
            fin.insert("ROE".into(), f64_series(&self.roe));
            fin.insert("TCAP".into(), scalar_series(self.total_shares));
            result.insert(
                "_DS_FINANCE".into(),
                Value::Array(vec![Value::Object(fin), Value::String("1q".into())]),
            );
        }

        result
    }
}

fn f64_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn f64_series(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|&v| f64_value(v)).collect())
}

fn ns_series(values: &[i64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}

fn scalar_series(value: Option<f64>) -> Value {
    Value::Array(value.into_iter().map(f64_value).collect())
}
