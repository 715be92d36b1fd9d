//! 聚合器集成测试。
//!
//! 用一个可注入故障的内存数据源验证拼装与降级行为。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use cnstock_core::Market;
use cnstock_data::{
    Adjust, DailyBar, DataSource, FinanceAbstractRow, FundFlowRow, SectorMap, SnapshotRow,
    SourceError, SourceResult, StockDataAggregator, SymbolEntry,
};

/// 内存数据源。按需注入各路子数据的故障。
#[derive(Default)]
struct MockSource {
    fail_bars: bool,
    empty_bars: bool,
    fail_unadjusted: bool,
    fail_finance: bool,
    fail_fund_flow: bool,
    fail_snapshot: bool,
    fail_sectors: bool,
    fail_sz_list: bool,
}

fn bar(date: &str, close: f64) -> DailyBar {
    DailyBar {
        date: date.to_string(),
        open: close - 0.2,
        high: close + 0.3,
        low: close - 0.4,
        close,
        volume: 100_000.0,
        amount: close * 100_000.0,
        ..Default::default()
    }
}

#[async_trait]
impl DataSource for MockSource {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn fetch_daily_bars(
        &self,
        _code: &str,
        _market: Market,
        _start: &str,
        _end: &str,
        adjust: Adjust,
    ) -> SourceResult<Vec<DailyBar>> {
        if adjust == Adjust::None {
            if self.fail_unadjusted {
                return Err(SourceError::Network("unadjusted down".into()));
            }
            return Ok(vec![
                bar("2024-01-02", 9.0),
                bar("2024-01-03", 10.0),
                bar("2024-01-04", 11.0),
            ]);
        }
        if self.fail_bars {
            return Err(SourceError::Network("bars down".into()));
        }
        if self.empty_bars {
            return Ok(Vec::new());
        }
        Ok(vec![
            bar("2024-01-02", 10.0),
            bar("2024-01-03", 11.0),
            bar("2024-01-04", 12.0),
        ])
    }

    async fn fetch_financial_abstract(
        &self,
        _code: &str,
        _market: Market,
    ) -> SourceResult<Vec<FinanceAbstractRow>> {
        if self.fail_finance {
            return Err(SourceError::Timeout("finance slow".into()));
        }
        // 故意乱序返回，聚合器应按报告期升序排列
        Ok(vec![
            FinanceAbstractRow {
                report_date: json!("2023-12-31 00:00:00"),
                main_revenue: json!(2.0e10),
                net_profit: json!(5.0e9),
                eps: json!(1.2),
                nav_per_share: json!(8.5),
                roe: json!("14.00%"),
            },
            FinanceAbstractRow {
                report_date: json!("2022-12-31 00:00:00"),
                main_revenue: json!(1.8e10),
                net_profit: json!(4.0e9),
                eps: json!(1.0),
                nav_per_share: json!(7.9),
                roe: json!("13.00%"),
            },
        ])
    }

    async fn fetch_fund_flow(
        &self,
        _code: &str,
        _market: Market,
    ) -> SourceResult<Vec<FundFlowRow>> {
        if self.fail_fund_flow {
            return Err(SourceError::Network("flow down".into()));
        }
        Ok(vec![FundFlowRow {
            date: json!("2024-01-04"),
            main_amount: Value::String("-123456789.0".into()),
            main_ratio: Value::String("-6.08".into()),
            extra_large_amount: Value::String("-169135679.0".into()),
            extra_large_ratio: Value::String("-8.33".into()),
            large_amount: Value::String("45678901.0".into()),
            large_ratio: Value::String("2.25".into()),
            medium_amount: Value::String("34567890.0".into()),
            medium_ratio: Value::String("1.70".into()),
            small_amount: Value::String("23456789.0".into()),
            small_ratio: Value::String("1.16".into()),
        }])
    }

    async fn fetch_snapshot(&self, _code: &str, _market: Market) -> SourceResult<SnapshotRow> {
        if self.fail_snapshot {
            return Err(SourceError::Network("snapshot down".into()));
        }
        Ok(SnapshotRow {
            name: "测试银行".to_string(),
            latest_price: json!(11.0),
            // 总股本缺失，期望用总市值/最新价反推
            total_shares: Value::Null,
            float_shares: json!(1.5e9),
            total_market_cap: json!(2.2e10),
            float_market_cap: json!(1.65e10),
            pe_ttm: json!(5.6),
        })
    }

    async fn fetch_sectors(&self, _code: &str, _market: Market) -> SourceResult<Vec<String>> {
        if self.fail_sectors {
            return Err(SourceError::Network("board down".into()));
        }
        Ok(vec!["银行".to_string(), "上海板块".to_string()])
    }

    async fn fetch_symbol_list(&self, market: Market) -> SourceResult<Vec<SymbolEntry>> {
        match market {
            Market::Sh => Ok(vec![SymbolEntry {
                code: "600000".to_string(),
                name: "浦发银行".to_string(),
            }]),
            Market::Sz if self.fail_sz_list => Err(SourceError::Network("sz down".into())),
            Market::Sz => Ok(vec![SymbolEntry {
                code: "000001".to_string(),
                name: "平安银行".to_string(),
            }]),
            Market::Unknown => Err(SourceError::UnknownMarket("?".into())),
        }
    }
}

fn aggregator(source: MockSource) -> StockDataAggregator {
    StockDataAggregator::new(Arc::new(source))
}

#[tokio::test]
async fn test_fetch_record_full() {
    let agg = aggregator(MockSource::default());
    let record = agg
        .fetch_record("SH600000", "2024-01-01", "2024-01-05")
        .await
        .unwrap();

    assert_eq!(record.symbol, "SH600000");
    assert_eq!(record.name, "测试银行");
    assert_eq!(record.len(), 3);
    assert_eq!(record.close, vec![10.0, 11.0, 12.0]);
    // 不复权序列来自独立子拉取
    assert_eq!(record.close_unadj, vec![9.0, 10.0, 11.0]);
    assert_eq!(record.given_cash, vec![0.0; 3]);

    // 财务按报告期升序
    assert_eq!(record.finance_len(), 2);
    assert!(record.finance_date[0] < record.finance_date[1]);
    assert_eq!(record.net_profit, vec![4.0e9, 5.0e9]);
    assert_eq!(record.roe, vec![13.0, 14.0]);

    // 总股本由总市值/最新价反推
    assert_eq!(record.total_shares, Some(2.2e10 / 11.0));
    assert_eq!(record.float_shares, Some(1.5e9));
    assert_eq!(record.pe_ttm, Some(5.6));

    // 资金流向取最新一行
    assert_eq!(record.fund_flow.main.amount, Some(-123456789.0));
    assert_eq!(record.fund_flow.main.ratio, Some(-6.08));
    assert_eq!(record.fund_flow.small.ratio, Some(1.16));

    assert_eq!(record.sectors, vec!["银行", "上海板块"]);
}

#[tokio::test]
async fn test_fetch_record_finance_failure_is_soft() {
    let agg = aggregator(MockSource {
        fail_finance: true,
        fail_fund_flow: true,
        ..Default::default()
    });
    let record = agg
        .fetch_record("SH600000", "2024-01-01", "2024-01-05")
        .await
        .unwrap();

    // K线仍然完整，财务与资金流向字段组缺失
    assert_eq!(record.len(), 3);
    assert_eq!(record.finance_len(), 0);
    assert_eq!(record.fund_flow.main.amount, None);
}

#[tokio::test]
async fn test_fetch_record_bars_failure_yields_empty() {
    let agg = aggregator(MockSource {
        fail_bars: true,
        ..Default::default()
    });
    let record = agg
        .fetch_record("SH600000", "2024-01-01", "2024-01-05")
        .await
        .unwrap();

    // 日线缺失即为空记录，即使财务/快照都在
    assert!(record.is_empty());
    assert_eq!(record.finance_len(), 2);
}

#[tokio::test]
async fn test_fetch_record_unadjusted_fallback() {
    let agg = aggregator(MockSource {
        fail_unadjusted: true,
        ..Default::default()
    });
    let record = agg
        .fetch_record("SH600000", "2024-01-01", "2024-01-05")
        .await
        .unwrap();

    // 不复权拉取失败时退回复权收盘价
    assert_eq!(record.close_unadj, record.close);
}

#[tokio::test]
async fn test_fetch_record_sector_fallback() {
    let sectors: SectorMap = [(
        "SH600000".to_string(),
        vec!["本地板块".to_string()],
    )]
    .into_iter()
    .collect();
    let agg = StockDataAggregator::new(Arc::new(MockSource {
        fail_sectors: true,
        ..Default::default()
    }))
    .with_sectors(sectors);

    let record = agg
        .fetch_record("SH600000", "2024-01-01", "2024-01-05")
        .await
        .unwrap();
    assert_eq!(record.sectors, vec!["本地板块"]);
}

#[tokio::test]
async fn test_fetch_symbol_list_partial_failure() {
    let agg = aggregator(MockSource {
        fail_sz_list: true,
        ..Default::default()
    });
    let listings = agg.fetch_symbol_list().await;

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].symbol, "SH600000");
    assert_eq!(listings[0].name, "浦发银行");
}

#[tokio::test]
async fn test_fetch_symbol_list_concatenates() {
    let agg = aggregator(MockSource::default());
    let listings = agg.fetch_symbol_list().await;

    let symbols: Vec<&str> = listings.iter().map(|l| l.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SH600000", "SZ000001"]);
}

#[tokio::test]
async fn test_fetch_records_batch_excludes_empty() {
    // 空记录的代码被剔除，其余保留
    let agg = aggregator(MockSource {
        empty_bars: true,
        ..Default::default()
    });
    let symbols = vec!["SH600000".to_string(), "SZ000001".to_string()];
    let records = agg
        .fetch_records_batch(&symbols, "2024-01-01", "2024-01-05")
        .await;
    assert!(records.is_empty());

    let agg = aggregator(MockSource::default());
    let records = agg
        .fetch_records_batch(&symbols, "2024-01-01", "2024-01-05")
        .await;
    let keys: HashSet<&str> = records.keys().map(String::as_str).collect();
    assert_eq!(keys, HashSet::from(["SH600000", "SZ000001"]));
}
