//! 数据聚合器。
//!
//! 把数据源的各类子数据（复权/不复权K线、财务摘要、资金流向、
//! 实时快照、所属板块）并发拉取后拼装成统一的 [`StockRecord`]。
//!
//! 每个子拉取都是"尽力而为"：上游故障或空结果只会让对应字段组缺失，
//! 不会影响其余子拉取，也不会让整次调用失败。六路并发在 `tokio::join!`
//! 处汇合，汇合之后才做合并，每个字段组只有一个写入方，无需加锁。

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use cnstock_core::record::{FundFlowSnapshot, StockRecord, TierFlow};
use cnstock_core::symbol::{from_provider_code, to_provider_code};
use cnstock_core::value::{parse_date_ns, parse_date_str_ns, parse_numeric};
use cnstock_core::Market;

use crate::error::SourceResult;
use crate::sector::SectorMap;
use crate::source::{Adjust, DailyBar, DataSource};

/// 批量拉取的并发上限。
const BATCH_CONCURRENCY: usize = 4;

/// 股票列表条目（规范代码）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolListing {
    /// 规范代码，如 "SH600000"
    pub symbol: String,
    /// 股票名称
    pub name: String,
}

/// 数据聚合器。
///
/// 持有一个可插拔的数据源和可选的本地板块映射，
/// 由调用方显式注入，不依赖全局状态。
pub struct StockDataAggregator {
    source: Arc<dyn DataSource>,
    sectors: SectorMap,
}

impl StockDataAggregator {
    /// 创建聚合器。
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            sectors: SectorMap::new(),
        }
    }

    /// 附加本地板块映射，作为接口板块查询的兜底。
    pub fn with_sectors(mut self, sectors: SectorMap) -> Self {
        self.sectors = sectors;
        self
    }

    /// 数据源名称。
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// 拉取单只股票的完整记录。
    ///
    /// 上游故障只会表现为字段组缺失，此调用本身不因上游故障失败。
    /// 没有任何日线历史时返回的记录 `is_empty()` 为真。
    pub async fn fetch_record(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
    ) -> SourceResult<StockRecord> {
        let t0 = Instant::now();
        let (code, market) = to_provider_code(symbol);

        let (bars, bars_unadj, finance, fund_flow, snapshot, boards) = tokio::join!(
            soft(symbol, "daily bars", self.load_bars(&code, market, start, end, Adjust::Forward)),
            soft(symbol, "unadjusted bars", self.load_bars(&code, market, start, end, Adjust::None)),
            soft(symbol, "financial abstract", self.load_finance(&code, market)),
            soft(symbol, "fund flow", self.load_fund_flow(&code, market)),
            soft(symbol, "snapshot", self.load_snapshot(&code, market)),
            soft(symbol, "sectors", self.source.fetch_sectors(&code, market)),
        );

        // 汇合之后合并，每个字段组只写一次
        let mut record = StockRecord::new(symbol);

        if let Some(snap) = snapshot {
            record.name = snap.name;
            record.total_shares = Some(snap.total_shares);
            record.total_market_cap = Some(snap.total_market_cap);
            record.float_market_cap = Some(snap.float_market_cap);
            record.float_shares = Some(snap.float_shares);
            record.pe_ttm = Some(snap.pe_ttm);
        }

        if let Some(group) = bars {
            let n = group.date.len();
            record.date = group.date;
            record.open = group.open;
            record.high = group.high;
            record.low = group.low;
            record.close = group.close;
            record.volume = group.volume;
            record.amount = group.amount;
            // 不复权序列必须与复权序列等长，取不到或错位时退回复权收盘价
            record.close_unadj = match bars_unadj {
                Some(unadj) if unadj.close.len() == n => unadj.close,
                _ => record.close.clone(),
            };
            record.given_cash = vec![0.0; n];
            record.given_share = vec![0.0; n];
        }

        if let Some(group) = finance {
            record.finance_date = group.date;
            record.main_revenue = group.main_revenue;
            record.net_profit = group.net_profit;
            record.eps = group.eps;
            record.nav_per_share = group.nav_per_share;
            record.roe = group.roe;
        }

        if let Some(flow) = fund_flow {
            record.fund_flow = flow;
        }

        record.sectors = match boards {
            Some(boards) if !boards.is_empty() => boards,
            _ => self.sectors.get(symbol).to_vec(),
        };

        info!(
            "[{}] fetch record cost {:.2}s, symbol: {}",
            self.source.name(),
            t0.elapsed().as_secs_f64(),
            symbol
        );

        Ok(record)
    }

    /// 直接拉取日K线（用于K线查询，不经过记录拼装）。
    pub async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
        adjust: Adjust,
    ) -> SourceResult<Vec<DailyBar>> {
        let (code, market) = to_provider_code(symbol);
        self.source
            .fetch_daily_bars(&code, market, start, end, adjust)
            .await
    }

    /// 拉取沪深两市的股票列表。
    ///
    /// 两个交易所的枚举并发执行，结果按序拼接、不去重；
    /// 任一侧失败只记录日志，保留另一侧的结果。
    pub async fn fetch_symbol_list(&self) -> Vec<SymbolListing> {
        let (sh, sz) = tokio::join!(
            self.source.fetch_symbol_list(Market::Sh),
            self.source.fetch_symbol_list(Market::Sz),
        );

        let mut listings = Vec::new();
        for (market, fetched) in [(Market::Sh, sh), (Market::Sz, sz)] {
            match fetched {
                Ok(entries) => {
                    listings.extend(entries.into_iter().map(|entry| SymbolListing {
                        symbol: from_provider_code(&entry.code, market.as_str()),
                        name: entry.name,
                    }));
                }
                Err(err) => {
                    warn!(market = %market, %err, "symbol list fetch failed");
                }
            }
        }
        listings
    }

    /// 批量拉取多只股票的记录。
    ///
    /// 受限并发扇出；记录为空或拉取出错的代码静默剔除，
    /// 批量调用本身永不失败。
    pub async fn fetch_records_batch(
        &self,
        symbols: &[String],
        start: &str,
        end: &str,
    ) -> HashMap<String, StockRecord> {
        let results: Vec<(String, SourceResult<StockRecord>)> = stream::iter(symbols)
            .map(|symbol| async move {
                let record = self.fetch_record(symbol, start, end).await;
                (symbol.clone(), record)
            })
            .buffer_unordered(BATCH_CONCURRENCY)
            .collect()
            .await;

        let mut records = HashMap::new();
        for (symbol, result) in results {
            match result {
                Ok(record) if !record.is_empty() => {
                    records.insert(symbol, record);
                }
                Ok(_) => debug!(symbol, "empty record excluded from batch"),
                Err(err) => warn!(symbol, %err, "record fetch failed, excluded from batch"),
            }
        }
        records
    }

    /// 拉取K线并清洗为日线字段组。
    async fn load_bars(
        &self,
        code: &str,
        market: Market,
        start: &str,
        end: &str,
        adjust: Adjust,
    ) -> SourceResult<BarsGroup> {
        let bars = self
            .source
            .fetch_daily_bars(code, market, start, end, adjust)
            .await?;
        BarsGroup::from_bars(bars)
    }

    /// 拉取财务摘要并清洗为财务字段组（按报告期升序）。
    async fn load_finance(&self, code: &str, market: Market) -> SourceResult<FinanceGroup> {
        let rows = self.source.fetch_financial_abstract(code, market).await?;

        let mut dated = Vec::with_capacity(rows.len());
        for row in rows {
            let ns = parse_date_ns(&row.report_date)?;
            dated.push((ns, row));
        }
        dated.sort_by_key(|(ns, _)| *ns);

        let mut group = FinanceGroup::default();
        for (ns, row) in dated {
            group.date.push(ns);
            group.main_revenue.push(parse_numeric(&row.main_revenue));
            group.net_profit.push(parse_numeric(&row.net_profit));
            group.eps.push(parse_numeric(&row.eps));
            group.nav_per_share.push(parse_numeric(&row.nav_per_share));
            group.roe.push(parse_numeric(&row.roe));
        }
        Ok(group)
    }

    /// 拉取资金流向并取最新一个交易日的快照。
    async fn load_fund_flow(&self, code: &str, market: Market) -> SourceResult<FundFlowSnapshot> {
        let rows = self.source.fetch_fund_flow(code, market).await?;

        let mut snapshot = FundFlowSnapshot::default();
        if let Some(latest) = rows.last() {
            let tier = |amount, ratio| TierFlow {
                amount: Some(parse_numeric(amount)),
                ratio: Some(parse_numeric(ratio)),
            };
            snapshot.main = tier(&latest.main_amount, &latest.main_ratio);
            snapshot.extra_large = tier(&latest.extra_large_amount, &latest.extra_large_ratio);
            snapshot.large = tier(&latest.large_amount, &latest.large_ratio);
            snapshot.medium = tier(&latest.medium_amount, &latest.medium_ratio);
            snapshot.small = tier(&latest.small_amount, &latest.small_ratio);
        }
        Ok(snapshot)
    }

    /// 拉取实时快照并推导股本类标量。
    async fn load_snapshot(&self, code: &str, market: Market) -> SourceResult<SnapshotGroup> {
        let row = self.source.fetch_snapshot(code, market).await?;

        let latest_price = parse_numeric(&row.latest_price);
        let total_market_cap = parse_numeric(&row.total_market_cap);
        let float_market_cap = parse_numeric(&row.float_market_cap);

        // 接口没给股本时用市值/最新价反推
        let mut total_shares = parse_numeric(&row.total_shares);
        if total_shares == 0.0 && latest_price > 0.0 {
            total_shares = total_market_cap / latest_price;
        }
        let mut float_shares = parse_numeric(&row.float_shares);
        if float_shares == 0.0 && latest_price > 0.0 {
            float_shares = float_market_cap / latest_price;
        }

        Ok(SnapshotGroup {
            name: row.name,
            total_shares,
            float_shares,
            total_market_cap,
            float_market_cap,
            pe_ttm: parse_numeric(&row.pe_ttm),
        })
    }
}

/// 尽力而为地执行一个子拉取：失败记日志并降级为缺失。
async fn soft<T>(
    symbol: &str,
    what: &str,
    fut: impl Future<Output = SourceResult<T>>,
) -> Option<T> {
    match fut.await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(symbol, what, %err, "sub-fetch degraded to absent");
            None
        }
    }
}

/// 日线字段组。
#[derive(Debug, Default)]
struct BarsGroup {
    date: Vec<i64>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    amount: Vec<f64>,
}

impl BarsGroup {
    fn from_bars(bars: Vec<DailyBar>) -> SourceResult<Self> {
        let mut group = Self::default();
        for bar in bars {
            group.date.push(parse_date_str_ns(&bar.date)?);
            group.open.push(bar.open);
            group.high.push(bar.high);
            group.low.push(bar.low);
            group.close.push(bar.close);
            group.volume.push(bar.volume);
            group.amount.push(bar.amount);
        }
        Ok(group)
    }
}

/// 财务字段组。
#[derive(Debug, Default)]
struct FinanceGroup {
    date: Vec<i64>,
    main_revenue: Vec<f64>,
    net_profit: Vec<f64>,
    eps: Vec<f64>,
    nav_per_share: Vec<f64>,
    roe: Vec<f64>,
}

/// 快照字段组。
#[derive(Debug)]
struct SnapshotGroup {
    name: String,
    total_shares: f64,
    float_shares: f64,
    total_market_cap: f64,
    float_market_cap: f64,
    pe_ttm: f64,
}
