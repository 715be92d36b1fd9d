//! 股票分析报告生成。
//!
//! 消费拼装好的 [`StockRecord`]，按固定的章节结构输出 UTF-8 文本报告：
//! `# 基本数据`、`# 交易数据`、`# 技术指标(最近30日)`、`# 财务数据`。
//! 章节标题与数值格式是下游消费方依赖的稳定约定。
//!
//! 没有日线历史的记录会短路为单行提示，不输出任何章节。

use std::fmt::Write as _;

use chrono::{Datelike, Timelike, Utc};
use tracing::warn;

use cnstock_core::record::{StockRecord, TierFlow};
use cnstock_core::symbol::is_stock;
use cnstock_core::value::{ns_to_date_string, ns_to_datetime};
use cnstock_data::source::{Adjust, DailyBar};

use crate::indicators::{
    BollParams, IndicatorEngine, IndicatorError, KdjParams, MacdParams, RsiParams,
};

/// 报告详细程度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    /// 基本数据 + 交易数据
    Brief,
    /// 基本数据 + 交易数据 + 财务数据
    Medium,
    /// 全部章节
    Full,
}

impl std::str::FromStr for ReportLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brief" => Ok(Self::Brief),
            "medium" => Ok(Self::Medium),
            "full" => Ok(Self::Full),
            _ => Err(format!("Unknown report level: {}", s)),
        }
    }
}

/// 报告生成选项。
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// 记录里没有名称时的兜底名称（来自本地名称表）
    pub fallback_name: Option<String>,
    /// 盘中成交量外推使用的"当前时刻"（纳秒时间戳），
    /// 不设置时取系统时钟；测试中注入固定值
    pub now_ns: Option<i64>,
}

/// 生成一只股票的完整分析报告。
///
/// 记录为空（没有日线历史）时直接返回单行提示，不输出任何章节。
pub fn build_stock_report(
    record: &StockRecord,
    level: ReportLevel,
    opts: &ReportOptions,
) -> String {
    if record.is_empty() {
        return format!("No data found for symbol: {}", record.symbol);
    }

    let include_financial = matches!(level, ReportLevel::Medium | ReportLevel::Full);
    let include_technical = matches!(level, ReportLevel::Full);

    let mut buf = String::new();
    let _ = write_basic(&mut buf, record, opts);
    let _ = write_trading(&mut buf, record, opts);
    if include_financial {
        let _ = write_financial(&mut buf, record);
    }
    if include_technical {
        let _ = write_technical(&mut buf, record);
    }
    buf
}

/// 过滤掉指数成分、融资标的之类的派生板块标签。
pub fn filter_sectors(sectors: &[String]) -> Vec<&str> {
    const BLACKLIST: [&str; 5] = ["MSCI", "标普", "同花顺", "融资融券", "沪股通"];
    sectors
        .iter()
        .map(String::as_str)
        .filter(|sector| !BLACKLIST.iter().any(|keyword| sector.contains(keyword)))
        .collect()
}

/// 返回报告期数组中最后一个 12 月（年报锚点）的索引。
pub fn yearly_fin_index(dates: &[i64]) -> Option<usize> {
    (0..dates.len())
        .rev()
        .find(|&i| ns_to_datetime(dates[i]).month() == 12)
}

// 沪深连续竞价时段（自午夜起的秒数）
const MORNING_OPEN: f64 = 9.0 * 3600.0 + 30.0 * 60.0;
const MORNING_CLOSE: f64 = 11.0 * 3600.0 + 30.0 * 60.0;
const AFTERNOON_OPEN: f64 = 13.0 * 3600.0;
const AFTERNOON_CLOSE: f64 = 15.0 * 3600.0;

/// 盘中成交量外推系数。
///
/// 最后一根日线是"今天"时，按已交易分钟把当日成交量外推到
/// 全天 240 分钟的水平；午间休市固定取 2（上午恰好过半）；
/// 非交易时段或最后一根不是今天时为 1。
pub fn intraday_volume_factor(last_bar_ns: i64, now_ns: i64) -> f64 {
    let bar_dt = ns_to_datetime(last_bar_ns);
    let now_dt = ns_to_datetime(now_ns);
    if bar_dt.date_naive() != now_dt.date_naive() {
        return 1.0;
    }

    let secs = now_dt.time().num_seconds_from_midnight() as f64;
    if (MORNING_OPEN..MORNING_CLOSE).contains(&secs) {
        let minutes = (secs - MORNING_OPEN) / 60.0;
        240.0 / (minutes + 1.0)
    } else if (MORNING_CLOSE..AFTERNOON_OPEN).contains(&secs) {
        2.0
    } else if (AFTERNOON_OPEN..AFTERNOON_CLOSE).contains(&secs) {
        let minutes = (secs - AFTERNOON_OPEN) / 60.0;
        240.0 / (120.0 + minutes + 1.0)
    } else {
        1.0
    }
}

fn write_basic(
    buf: &mut String,
    record: &StockRecord,
    opts: &ReportOptions,
) -> std::fmt::Result {
    writeln!(buf, "# 基本数据")?;
    writeln!(buf)?;

    // 优先用数据源返回的名称，其次本地名称表，最后退回代码本身
    let name: &str = if !record.name.is_empty() {
        &record.name
    } else {
        opts.fallback_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&record.symbol)
    };

    writeln!(buf, "- 股票代码: {}", record.symbol)?;
    writeln!(buf, "- 股票名称: {}", name)?;

    let last_ns = record.date.last().copied().unwrap_or(0);
    writeln!(buf, "- 数据日期: {}", ns_to_date_string(last_ns))?;

    let sector = filter_sectors(&record.sectors).join(" ");
    if !sector.is_empty() {
        writeln!(buf, "- 行业概念: {}", sector)?;
    }

    if is_stock(&record.symbol) {
        let total_shares = record.total_shares.unwrap_or(0.0);
        let current_price = record.close_unadj.last().copied().unwrap_or(0.0);

        // 市盈率(静)：以最后一个年报（12月报告期）的净利润为分母
        if total_shares > 0.0 && current_price > 0.0 {
            let annual_index = yearly_fin_index(&record.finance_date)
                .filter(|&i| i < record.net_profit.len());
            if let Some(index) = annual_index {
                let net_profit = record.net_profit[index];
                let total_amount = total_shares * current_price;
                let pe_static = if net_profit != 0.0 {
                    total_amount / net_profit
                } else {
                    f64::INFINITY
                };
                writeln!(buf, "- 市盈率(静): {:.2}", pe_static)?;
            }
        }

        // 市净率：分母为零时整行省略
        let navps = record.nav_per_share.last().copied().unwrap_or(0.0);
        if navps != 0.0 && current_price > 0.0 {
            writeln!(buf, "- 市净率: {:.2}", current_price / navps)?;
        }

        if let Some(roe) = record.roe.last() {
            writeln!(buf, "- 净资产收益率: {:.2}", roe)?;
        }
    }

    writeln!(buf)?;
    Ok(())
}

fn write_trading(
    buf: &mut String,
    record: &StockRecord,
    opts: &ReportOptions,
) -> std::fmt::Result {
    let close = &record.close;
    let n = close.len();
    if n == 0 {
        return Ok(());
    }

    let now_ns = opts.now_ns.unwrap_or_else(current_ns);
    let factor = intraday_volume_factor(record.date.last().copied().unwrap_or(0), now_ns);

    let mut volume = record.volume.clone();
    if let Some(last) = volume.last_mut() {
        *last *= factor;
    }
    let mut amount: Vec<f64> = record.amount.iter().map(|v| v / 1e8).collect();
    if let Some(last) = amount.last_mut() {
        *last *= factor;
    }

    let high = &record.high;
    let low = &record.low;
    let periods: Vec<usize> = [5, 20, 60, 120, 240]
        .into_iter()
        .filter(|&p| p <= n)
        .collect();

    writeln!(buf, "# 交易数据")?;
    writeln!(buf)?;

    writeln!(buf, "## 价格")?;
    writeln!(
        buf,
        "- 当日: {:.3} 最高: {:.3} 最低: {:.3}",
        close[n - 1],
        high[n - 1],
        low[n - 1]
    )?;
    for &p in &periods {
        writeln!(
            buf,
            "- {}日均价: {:.3} 最高: {:.3} 最低: {:.3}",
            p,
            mean(&close[n - p..]),
            max(&high[n - p..]),
            min(&low[n - p..])
        )?;
    }
    writeln!(buf)?;

    writeln!(buf, "## 振幅")?;
    if low[n - 1] != 0.0 {
        writeln!(buf, "- 当日: {}", pct(high[n - 1] / low[n - 1] - 1.0))?;
    }
    for &p in &periods {
        let min_low = min(&low[n - p..]);
        if min_low != 0.0 {
            writeln!(
                buf,
                "- {}日振幅: {}",
                p,
                pct(max(&high[n - p..]) / min_low - 1.0)
            )?;
        }
    }
    writeln!(buf)?;

    writeln!(buf, "## 涨跌幅")?;
    if n >= 2 && close[n - 2] != 0.0 {
        writeln!(buf, "- 当日: {}", pct(close[n - 1] / close[n - 2] - 1.0))?;
    }
    for &p in &periods {
        if close[n - p] != 0.0 {
            writeln!(
                buf,
                "- {}日累计: {:.2}%",
                p,
                (close[n - 1] / close[n - p] - 1.0) * 100.0
            )?;
        }
    }
    writeln!(buf)?;

    writeln!(buf, "## 成交量(万手)")?;
    writeln!(buf, "- 当日: {:.2}", volume[n - 1] / 1e6)?;
    for &p in &periods {
        writeln!(buf, "- {}日均量(万手): {:.2}", p, mean(&volume[n - p..]) / 1e6)?;
    }
    writeln!(buf)?;

    writeln!(buf, "## 成交额(亿)")?;
    writeln!(buf, "- 当日: {:.2}", amount[n - 1])?;
    for &p in &periods {
        writeln!(buf, "- {}日均额(亿): {:.2}", p, mean(&amount[n - p..]))?;
    }
    writeln!(buf)?;

    writeln!(buf, "## 资金流向")?;
    let tiers: [(&str, TierFlow); 5] = [
        ("主力", record.fund_flow.main),
        ("超大单", record.fund_flow.extra_large),
        ("大单", record.fund_flow.large),
        ("中单", record.fund_flow.medium),
        ("小单", record.fund_flow.small),
    ];
    let mut has_fund_flow = false;
    for (label, tier) in tiers {
        if let Some(line) = fund_flow_line(label, tier) {
            writeln!(buf, "{}", line)?;
            has_fund_flow = true;
        }
    }
    if !has_fund_flow {
        writeln!(buf, "- 暂无资金流向数据")?;
    }
    writeln!(buf)?;

    if is_stock(&record.symbol) {
        let total_shares = record.total_shares.unwrap_or(0.0);
        if total_shares > 0.0 {
            writeln!(buf, "## 换手率")?;
            writeln!(buf, "- 当日: {}", pct(volume[n - 1] / total_shares))?;
            for &p in &periods {
                writeln!(
                    buf,
                    "- {}日均换手: {}",
                    p,
                    pct(mean(&volume[n - p..]) / total_shares)
                )?;
                writeln!(
                    buf,
                    "- {}日总换手: {}",
                    p,
                    pct(sum(&volume[n - p..]) / total_shares)
                )?;
            }
            writeln!(buf)?;
        }
    }

    Ok(())
}

/// 单档资金流向行；净额或占比缺失时整行跳过。
fn fund_flow_line(label: &str, tier: TierFlow) -> Option<String> {
    let amount = tier.amount? / 1e8;
    let ratio = tier.ratio?;
    let direction = if amount > 0.0 { "流入" } else { "流出" };
    Some(format!(
        "- {} {}: {:.2}亿, 占比: {:.2}%",
        label,
        direction,
        amount.abs(),
        ratio.abs()
    ))
}

fn write_technical(buf: &mut String, record: &StockRecord) -> std::fmt::Result {
    let close = &record.close;
    if close.len() < 30 {
        return Ok(());
    }
    let n = close.len();
    let high = &record.high;
    let low = &record.low;

    let engine = IndicatorEngine::new();
    let computed = (|| -> Result<_, IndicatorError> {
        Ok((
            engine.kdj(high, low, close, KdjParams::default())?,
            engine.macd(close, MacdParams::default())?,
            engine.rsi(close, RsiParams { period: 6 })?,
            engine.rsi(close, RsiParams { period: 12 })?,
            engine.rsi(close, RsiParams { period: 24 })?,
            engine.bollinger(close, BollParams::default())?,
        ))
    })();
    let (kdj, macd, rsi6, rsi12, rsi24, boll) = match computed {
        Ok(series) => series,
        Err(err) => {
            warn!(symbol = %record.symbol, %err, "indicator computation failed, section skipped");
            return Ok(());
        }
    };

    writeln!(buf, "# 技术指标(最近30日)")?;
    writeln!(buf)?;

    let headers = [
        "日期",
        "KDJ.K",
        "KDJ.D",
        "KDJ.J",
        "MACD DIF",
        "MACD DEA",
        "RSI(6)",
        "RSI(12)",
        "RSI(24)",
        "BBands Upper",
        "BBands Middle",
        "BBands Lower",
    ];
    writeln!(buf, "| {} |", headers.join(" | "))?;
    writeln!(buf, "{}|", "| --- ".repeat(headers.len()))?;

    // 最近 30 个交易日，按时间正序渲染（最新在最后）
    for i in n.saturating_sub(30)..n {
        let cells = [
            kdj.k[i],
            kdj.d[i],
            kdj.j[i],
            macd.dif[i],
            macd.dea[i],
            rsi6[i],
            rsi12[i],
            rsi24[i],
            boll.upper[i],
            boll.middle[i],
            boll.lower[i],
        ];
        let values: Vec<String> = cells.iter().map(|&cell| render_cell(cell)).collect();
        writeln!(
            buf,
            "| {} | {} |",
            ns_to_date_string(record.date[i]),
            values.join(" | ")
        )?;
    }
    writeln!(buf)?;
    Ok(())
}

fn render_cell(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}", value),
        None => "N/A".to_string(),
    }
}

fn write_financial(buf: &mut String, record: &StockRecord) -> std::fmt::Result {
    if !is_stock(&record.symbol) {
        return Ok(());
    }

    writeln!(buf, "# 财务数据")?;
    writeln!(buf)?;

    let dates = &record.finance_date;
    if dates.is_empty() {
        writeln!(buf, "- 暂无财务数据")?;
        writeln!(buf)?;
        return Ok(());
    }

    const MAX_YEARS: usize = 5;
    let mut years: Vec<(String, [f64; 5])> = Vec::new();

    // 从最新往回收集年报（12月报告期）；最早一期可能不完整，始终跳过
    let mut i = dates.len();
    while i > 1 && years.len() < MAX_YEARS {
        i -= 1;
        let date = ns_to_datetime(dates[i]);
        if date.month() != 12 {
            continue;
        }
        let at = |series: &[f64], div: f64| series.get(i).copied().unwrap_or(0.0) / div;
        years.push((
            format!("{}年度", date.year()),
            [
                at(&record.main_revenue, 1e8),
                at(&record.net_profit, 1e8),
                at(&record.eps, 1.0),
                at(&record.nav_per_share, 1.0),
                at(&record.roe, 1.0),
            ],
        ));
    }

    if years.is_empty() {
        writeln!(buf, "- 暂无年度财务数据")?;
        writeln!(buf)?;
        return Ok(());
    }

    let fields = [
        "主营收入(亿元)",
        "净利润(亿元)",
        "每股收益",
        "每股净资产",
        "净资产收益率(%)",
    ];

    let header_cells: Vec<String> = years.iter().map(|(year, _)| format!("{} |", year)).collect();
    writeln!(buf, "| 指标 | {}", header_cells.join(" "))?;
    writeln!(buf, "{}|", "| --- ".repeat(years.len() + 1))?;
    for (index, field) in fields.iter().enumerate() {
        let cells: Vec<String> = years
            .iter()
            .map(|(_, values)| format!("{:.2} |", values[index]))
            .collect();
        writeln!(buf, "| {} | {}", field, cells.join(" "))?;
    }
    writeln!(buf)?;
    Ok(())
}

// ==================== K线渲染 ====================

/// 渲染单日K线数据。
pub fn render_kline_daily(symbol: &str, date: &str, adjust: Adjust, bar: &DailyBar) -> String {
    let mut buf = String::new();
    let _ = write_kline_daily(&mut buf, symbol, date, adjust, bar);
    buf
}

fn write_kline_daily(
    buf: &mut String,
    symbol: &str,
    date: &str,
    adjust: Adjust,
    bar: &DailyBar,
) -> std::fmt::Result {
    writeln!(buf, "# {} {} 日K线数据 ({})", symbol, date, adjust.label())?;
    writeln!(buf)?;
    writeln!(buf, "- 开盘价: {:.2}", bar.open)?;
    writeln!(buf, "- 收盘价: {:.2}", bar.close)?;
    writeln!(buf, "- 最高价: {:.2}", bar.high)?;
    writeln!(buf, "- 最低价: {:.2}", bar.low)?;
    writeln!(buf, "- 成交量: {}", thousands(bar.volume, 0))?;
    writeln!(buf, "- 成交额: {}", thousands(bar.amount, 2))?;
    writeln!(buf, "- 涨跌幅: {:.2}%", bar.change_pct)?;
    writeln!(buf, "- 涨跌额: {:.2}", bar.change_amount)?;
    writeln!(buf, "- 振幅: {:.2}%", bar.amplitude)?;
    writeln!(buf, "- 换手率: {:.2}%", bar.turnover_rate)?;
    Ok(())
}

/// 渲染日期区间的K线表格。
pub fn render_kline_range(
    symbol: &str,
    start: &str,
    end: &str,
    adjust: Adjust,
    bars: &[DailyBar],
) -> String {
    let mut buf = String::new();
    let _ = write_kline_range(&mut buf, symbol, start, end, adjust, bars);
    buf
}

fn write_kline_range(
    buf: &mut String,
    symbol: &str,
    start: &str,
    end: &str,
    adjust: Adjust,
    bars: &[DailyBar],
) -> std::fmt::Result {
    writeln!(
        buf,
        "# {} K线数据 ({} 至 {}, {})",
        symbol,
        start,
        end,
        adjust.label()
    )?;
    writeln!(buf)?;
    writeln!(buf, "共 {} 个交易日", bars.len())?;
    writeln!(buf)?;

    writeln!(buf, "| 日期 | 开盘 | 收盘 | 最高 | 最低 | 成交量 | 涨跌幅 |")?;
    writeln!(buf, "| --- | ---: | ---: | ---: | ---: | ---: | ---: |")?;
    for bar in bars {
        writeln!(
            buf,
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {} | {:.2}% |",
            bar.date,
            bar.open,
            bar.close,
            bar.high,
            bar.low,
            thousands(bar.volume, 0),
            bar.change_pct
        )?;
    }
    Ok(())
}

// ==================== 格式化工具 ====================

/// 比例格式化为两位小数的百分数（输入为小数，如 0.0123 -> "1.23%"）。
fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// 数值按千位分组格式化。
fn thousands(value: f64, decimals: usize) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    let len = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn current_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
