//! 东方财富行情接口客户端。
//!
//! 通过东方财富的公开行情接口获取 A 股数据。
//!
//! # 支持数据
//!
//! - 日K线（前复权/后复权/不复权，push2his kline 接口）
//! - 个股资金流向（push2his fflow 接口）
//! - 实时行情与估值快照（push2 接口，`fltt=2` 返回已缩放的浮点值）
//! - 财务摘要（datacenter F10 主要财务指标）
//! - 所属板块、沪深股票列表
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use cnstock_data::{DataSource, EastmoneyClient};
//! use cnstock_core::Market;
//!
//! let client = EastmoneyClient::new();
//! let snapshot = client.fetch_snapshot("600000", Market::Sh).await?;
//! println!("浦发银行最新价: {:?}", snapshot.latest_price);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use cnstock_core::config::HttpConfig;
use cnstock_core::symbol::infer_market;
use cnstock_core::value::parse_numeric_str;
use cnstock_core::Market;

use crate::error::{SourceError, SourceResult};
use crate::source::{
    Adjust, DailyBar, DataSource, FinanceAbstractRow, FundFlowRow, SnapshotRow, SymbolEntry,
};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 东方财富行情客户端。
#[derive(Clone)]
pub struct EastmoneyClient {
    client: reqwest::Client,
    quote_base: String,
    history_base: String,
    datacenter_base: String,
}

impl EastmoneyClient {
    /// 使用默认 HTTP 设置创建。
    pub fn new() -> Self {
        Self::with_config(&HttpConfig::default())
    }

    /// 使用指定 HTTP 设置创建（超时、可选代理）。
    pub fn with_config(config: &HttpConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT);

        if let Some(proxy) = &config.proxy {
            match reqwest::Proxy::all(proxy) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => debug!(%err, "invalid proxy setting ignored"),
            }
        }

        let client = builder.build().expect("HTTP 客户端创建失败");

        Self {
            client,
            quote_base: "https://push2.eastmoney.com".to_string(),
            history_base: "https://push2his.eastmoney.com".to_string(),
            datacenter_base: "https://datacenter-web.eastmoney.com".to_string(),
        }
    }

    /// 组合行情接口的 secid（沪市前缀 1，深市前缀 0）。
    ///
    /// 市场未知时按代码首位再推断一次，仍然未知则兜底按深市处理。
    fn secid(code: &str, market: Market) -> String {
        let market = match market {
            Market::Unknown => infer_market(code),
            known => known,
        };
        match market {
            Market::Sh => format!("1.{}", code),
            Market::Sz => format!("0.{}", code),
            Market::Unknown => {
                debug!(code, "market unresolved, falling back to SZ segment");
                format!("0.{}", code)
            }
        }
    }

    /// 组合 datacenter 接口的证券代码（如 "600000.SH"）。
    fn secucode(code: &str, market: Market) -> String {
        let market = match market {
            Market::Unknown => infer_market(code),
            known => known,
        };
        match market {
            Market::Sh => format!("{}.SH", code),
            _ => format!("{}.SZ", code),
        }
    }

    async fn get_text(&self, url: &str) -> SourceResult<String> {
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::Api {
                code: 429,
                message: "rate limited".to_string(),
            });
        }
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Default for EastmoneyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for EastmoneyClient {
    fn name(&self) -> &str {
        "Eastmoney"
    }

    async fn fetch_daily_bars(
        &self,
        code: &str,
        market: Market,
        start: &str,
        end: &str,
        adjust: Adjust,
    ) -> SourceResult<Vec<DailyBar>> {
        let url = format!(
            "{}/api/qt/stock/kline/get?secid={}&klt=101&fqt={}&beg={}&end={}\
             &fields1=f1,f2,f3,f4,f5,f6&fields2=f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61",
            self.history_base,
            Self::secid(code, market),
            adjust.fqt(),
            start.replace('-', ""),
            end.replace('-', ""),
        );
        let body = self.get_text(&url).await?;
        parse_kline_payload(&body)
    }

    async fn fetch_financial_abstract(
        &self,
        code: &str,
        market: Market,
    ) -> SourceResult<Vec<FinanceAbstractRow>> {
        let url = format!(
            "{}/api/data/v1/get?reportName=RPT_F10_FINANCE_MAINFINADATA\
             &columns=REPORT_DATE,TOTAL_OPERATE_INCOME,PARENT_NETPROFIT,EPSJB,BPS,ROEJQ\
             &filter=(SECUCODE%3D%22{}%22)&pageSize=60&sortColumns=REPORT_DATE&sortTypes=1",
            self.datacenter_base,
            Self::secucode(code, market),
        );
        let body = self.get_text(&url).await?;
        parse_finance_payload(&body)
    }

    async fn fetch_fund_flow(
        &self,
        code: &str,
        market: Market,
    ) -> SourceResult<Vec<FundFlowRow>> {
        let url = format!(
            "{}/api/qt/stock/fflow/daykline/get?secid={}&lmt=0&klt=101\
             &fields1=f1,f2,f3,f7&fields2=f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61",
            self.history_base,
            Self::secid(code, market),
        );
        let body = self.get_text(&url).await?;
        parse_fund_flow_payload(&body)
    }

    async fn fetch_snapshot(&self, code: &str, market: Market) -> SourceResult<SnapshotRow> {
        let url = format!(
            "{}/api/qt/stock/get?secid={}&invt=2&fltt=2&fields=f43,f58,f84,f85,f116,f117,f162",
            self.quote_base,
            Self::secid(code, market),
        );
        let body = self.get_text(&url).await?;
        parse_snapshot_payload(&body)
    }

    async fn fetch_sectors(&self, code: &str, market: Market) -> SourceResult<Vec<String>> {
        let url = format!(
            "{}/api/qt/slist/get?secid={}&spt=3&fltt=2&pn=1&pz=50&fields=f14",
            self.quote_base,
            Self::secid(code, market),
        );
        let body = self.get_text(&url).await?;
        parse_board_payload(&body)
    }

    async fn fetch_symbol_list(&self, market: Market) -> SourceResult<Vec<SymbolEntry>> {
        // fs 参数筛选交易所与证券类别（沪A / 深A）
        let fs = match market {
            Market::Sh => "m:1+t:2,m:1+t:23",
            Market::Sz => "m:0+t:6,m:0+t:80",
            Market::Unknown => return Err(SourceError::UnknownMarket(market.to_string())),
        };
        let url = format!(
            "{}/api/qt/clist/get?pn=1&pz=10000&po=1&fltt=2&fields=f12,f14&fs={}",
            self.quote_base, fs,
        );
        let body = self.get_text(&url).await?;
        parse_symbol_list_payload(&body)
    }
}

// ==================== 响应解析 ====================
//
// 解析逻辑与网络传输分离，便于用固定报文做测试。

/// 解析日K线响应。
///
/// `data.klines` 是逗号拼接的行：
/// `日期,开盘,收盘,最高,最低,成交量,成交额,振幅,涨跌幅,涨跌额,换手率`。
pub(crate) fn parse_kline_payload(body: &str) -> SourceResult<Vec<DailyBar>> {
    let root: Value = serde_json::from_str(body)?;
    let klines = match root.pointer("/data/klines").and_then(Value::as_array) {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    let mut bars = Vec::with_capacity(klines.len());
    for row in klines {
        let text = match row.as_str() {
            Some(text) => text,
            None => continue,
        };
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() < 11 {
            continue;
        }
        bars.push(DailyBar {
            date: fields[0].to_string(),
            open: parse_numeric_str(fields[1]),
            close: parse_numeric_str(fields[2]),
            high: parse_numeric_str(fields[3]),
            low: parse_numeric_str(fields[4]),
            volume: parse_numeric_str(fields[5]),
            amount: parse_numeric_str(fields[6]),
            amplitude: parse_numeric_str(fields[7]),
            change_pct: parse_numeric_str(fields[8]),
            change_amount: parse_numeric_str(fields[9]),
            turnover_rate: parse_numeric_str(fields[10]),
        });
    }
    Ok(bars)
}

/// 解析资金流向响应。
///
/// `data.klines` 行格式：
/// `日期,主力净额,小单净额,中单净额,大单净额,超大单净额,
///  主力净占比,小单净占比,中单净占比,大单净占比,超大单净占比`。
pub(crate) fn parse_fund_flow_payload(body: &str) -> SourceResult<Vec<FundFlowRow>> {
    let root: Value = serde_json::from_str(body)?;
    let klines = match root.pointer("/data/klines").and_then(Value::as_array) {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::with_capacity(klines.len());
    for row in klines {
        let text = match row.as_str() {
            Some(text) => text,
            None => continue,
        };
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() < 11 {
            continue;
        }
        let raw = |i: usize| Value::String(fields[i].to_string());
        rows.push(FundFlowRow {
            date: raw(0),
            main_amount: raw(1),
            small_amount: raw(2),
            medium_amount: raw(3),
            large_amount: raw(4),
            extra_large_amount: raw(5),
            main_ratio: raw(6),
            small_ratio: raw(7),
            medium_ratio: raw(8),
            large_ratio: raw(9),
            extra_large_ratio: raw(10),
        });
    }
    Ok(rows)
}

/// 解析实时快照响应。
pub(crate) fn parse_snapshot_payload(body: &str) -> SourceResult<SnapshotRow> {
    let root: Value = serde_json::from_str(body)?;
    let data = match root.get("data") {
        Some(data) if !data.is_null() => data,
        _ => return Err(SourceError::NoData("snapshot".to_string())),
    };

    let field = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);
    Ok(SnapshotRow {
        name: data
            .get("f58")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        latest_price: field("f43"),
        total_shares: field("f84"),
        float_shares: field("f85"),
        total_market_cap: field("f116"),
        float_market_cap: field("f117"),
        pe_ttm: field("f162"),
    })
}

/// 解析财务摘要响应（datacenter F10 主要指标）。
pub(crate) fn parse_finance_payload(body: &str) -> SourceResult<Vec<FinanceAbstractRow>> {
    let root: Value = serde_json::from_str(body)?;
    let data = match root.pointer("/result/data").and_then(Value::as_array) {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::with_capacity(data.len());
    for item in data {
        let field = |key: &str| item.get(key).cloned().unwrap_or(Value::Null);
        rows.push(FinanceAbstractRow {
            report_date: field("REPORT_DATE"),
            main_revenue: field("TOTAL_OPERATE_INCOME"),
            net_profit: field("PARENT_NETPROFIT"),
            eps: field("EPSJB"),
            nav_per_share: field("BPS"),
            roe: field("ROEJQ"),
        });
    }
    Ok(rows)
}

/// 解析所属板块响应。
pub(crate) fn parse_board_payload(body: &str) -> SourceResult<Vec<String>> {
    let root: Value = serde_json::from_str(body)?;
    let diff = match root.pointer("/data/diff") {
        Some(diff) => diff,
        None => return Ok(Vec::new()),
    };

    let mut boards = Vec::new();
    let mut push_name = |item: &Value| {
        if let Some(name) = item.get("f14").and_then(Value::as_str) {
            if !name.is_empty() {
                boards.push(name.to_string());
            }
        }
    };
    match diff {
        Value::Array(items) => items.iter().for_each(&mut push_name),
        // 部分接口版本把 diff 返回成以序号为键的对象
        Value::Object(map) => map.values().for_each(&mut push_name),
        _ => {}
    }
    Ok(boards)
}

/// 解析股票列表响应。
pub(crate) fn parse_symbol_list_payload(body: &str) -> SourceResult<Vec<SymbolEntry>> {
    let root: Value = serde_json::from_str(body)?;
    let diff = match root.pointer("/data/diff") {
        Some(diff) => diff,
        None => return Ok(Vec::new()),
    };

    let mut entries = Vec::new();
    let mut push_entry = |item: &Value| {
        let code = item.get("f12").and_then(Value::as_str).unwrap_or("");
        let name = item.get("f14").and_then(Value::as_str).unwrap_or("");
        if !code.is_empty() && !name.is_empty() {
            entries.push(SymbolEntry {
                code: code.to_string(),
                name: name.to_string(),
            });
        }
    };
    match diff {
        Value::Array(items) => items.iter().for_each(&mut push_entry),
        Value::Object(map) => map.values().for_each(&mut push_entry),
        _ => {}
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secid() {
        assert_eq!(EastmoneyClient::secid("600000", Market::Sh), "1.600000");
        assert_eq!(EastmoneyClient::secid("000001", Market::Sz), "0.000001");
        // 市场未知时按首位推断
        assert_eq!(EastmoneyClient::secid("600000", Market::Unknown), "1.600000");
        assert_eq!(EastmoneyClient::secid("300750", Market::Unknown), "0.300750");
    }

    #[test]
    fn test_parse_kline_payload() {
        let body = r#"{
            "rc": 0,
            "data": {
                "code": "600000",
                "name": "浦发银行",
                "klines": [
                    "2024-01-02,7.05,7.11,7.13,7.02,286100,202956434.00,1.56,0.85,0.06,0.10",
                    "2024-01-03,7.10,7.08,7.15,7.05,254300,180456434.00,1.41,-0.42,-0.03,0.09"
                ]
            }
        }"#;
        let bars = parse_kline_payload(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, "2024-01-02");
        assert_eq!(bars[0].open, 7.05);
        assert_eq!(bars[0].close, 7.11);
        assert_eq!(bars[0].high, 7.13);
        assert_eq!(bars[0].low, 7.02);
        assert_eq!(bars[0].volume, 286100.0);
        assert_eq!(bars[1].change_pct, -0.42);
    }

    #[test]
    fn test_parse_kline_payload_empty() {
        assert!(parse_kline_payload(r#"{"rc":0,"data":null}"#).unwrap().is_empty());
        // 字段不足的行被跳过
        let body = r#"{"data":{"klines":["2024-01-02,7.05"]}}"#;
        assert!(parse_kline_payload(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_fund_flow_payload() {
        let body = r#"{
            "data": {
                "klines": [
                    "2024-01-02,-123456789.0,23456789.0,34567890.0,45678901.0,-169135679.0,-6.08,1.16,1.70,2.25,-8.33"
                ]
            }
        }"#;
        let rows = parse_fund_flow_payload(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].main_amount, Value::String("-123456789.0".into()));
        assert_eq!(rows[0].extra_large_amount, Value::String("-169135679.0".into()));
        assert_eq!(rows[0].main_ratio, Value::String("-6.08".into()));
        assert_eq!(rows[0].small_ratio, Value::String("1.16".into()));
    }

    #[test]
    fn test_parse_snapshot_payload() {
        let body = r#"{
            "data": {
                "f43": 7.11,
                "f58": "浦发银行",
                "f84": 29352080397.0,
                "f85": 29352080397.0,
                "f116": 208693291622.67,
                "f117": 208693291622.67,
                "f162": 5.62
            }
        }"#;
        let snapshot = parse_snapshot_payload(body).unwrap();
        assert_eq!(snapshot.name, "浦发银行");
        assert_eq!(snapshot.latest_price, serde_json::json!(7.11));
        assert_eq!(snapshot.pe_ttm, serde_json::json!(5.62));
    }

    #[test]
    fn test_parse_snapshot_payload_no_data() {
        assert!(parse_snapshot_payload(r#"{"data":null}"#).is_err());
    }

    #[test]
    fn test_parse_finance_payload() {
        let body = r#"{
            "success": true,
            "result": {
                "data": [
                    {
                        "REPORT_DATE": "2023-12-31 00:00:00",
                        "TOTAL_OPERATE_INCOME": 173434000000.0,
                        "PARENT_NETPROFIT": 36702000000.0,
                        "EPSJB": 1.12,
                        "BPS": 21.46,
                        "ROEJQ": 5.48
                    }
                ]
            }
        }"#;
        let rows = parse_finance_payload(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].report_date, Value::String("2023-12-31 00:00:00".into()));
        assert_eq!(rows[0].eps, serde_json::json!(1.12));
    }

    #[test]
    fn test_parse_board_payload() {
        let body = r#"{"data":{"diff":[{"f14":"银行"},{"f14":"上海板块"},{"f14":""}]}}"#;
        let boards = parse_board_payload(body).unwrap();
        assert_eq!(boards, vec!["银行".to_string(), "上海板块".to_string()]);
    }

    #[test]
    fn test_parse_symbol_list_payload() {
        let body = r#"{
            "data": {
                "total": 2,
                "diff": [
                    {"f12": "600000", "f14": "浦发银行"},
                    {"f12": "600036", "f14": "招商银行"}
                ]
            }
        }"#;
        let entries = parse_symbol_list_payload(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "600000");
        assert_eq!(entries[1].name, "招商银行");
    }

    #[tokio::test]
    #[ignore] // 实际网络测试默认跳过
    async fn test_fetch_snapshot_live() {
        let client = EastmoneyClient::new();
        let result = client.fetch_snapshot("600000", Market::Sh).await;

        match result {
            Ok(snapshot) => {
                println!("浦发银行快照: {:?}", snapshot);
                assert!(!snapshot.name.is_empty());
            }
            Err(e) => eprintln!("请求失败: {}", e),
        }
    }
}
