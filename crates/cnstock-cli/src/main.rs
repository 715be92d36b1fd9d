//! A 股数据报告 CLI。
//!
//! # 使用示例
//!
//! ```bash
//! # 浦发银行完整报告
//! cnstock report -s SH600000
//!
//! # 只看基本与交易数据
//! cnstock report -s SH600000 --level brief
//!
//! # 指定日期区间的前复权日K线
//! cnstock kline -s SH600000 -f 2024-01-01 -t 2024-03-01 --adjust qfq
//!
//! # 沪深股票列表
//! cnstock list
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cnstock_core::AppConfig;
use cnstock_data::{Adjust, EastmoneyClient, SectorMap, StockDataAggregator, SymbolDirectory};
use cnstock_research::{
    build_stock_report, render_kline_daily, render_kline_range, ReportLevel, ReportOptions,
};

#[derive(Parser)]
#[command(name = "cnstock")]
#[command(about = "A股行情数据与分析报告工具", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成个股分析报告
    Report {
        /// 股票代码（如 SH600000、SZ000001）
        #[arg(short, long)]
        symbol: String,

        /// 报告级别（brief: 基本+交易, medium: +财务, full: 全部）
        #[arg(short, long, default_value = "full")]
        level: String,

        /// 截止日期（YYYY-MM-DD，默认今天）
        #[arg(short, long)]
        end: Option<String>,
    },

    /// 查询日K线
    Kline {
        /// 股票代码（如 SH600000、SZ000001）
        #[arg(short, long)]
        symbol: String,

        /// 开始日期（YYYY-MM-DD）
        #[arg(short = 'f', long)]
        from: String,

        /// 结束日期（YYYY-MM-DD）
        #[arg(short, long)]
        to: String,

        /// 复权方式（qfq: 前复权, hfq: 后复权, none: 不复权）
        #[arg(short, long, default_value = "qfq")]
        adjust: String,
    },

    /// 列出沪深全部股票
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let cli = Cli::parse();

    let source = Arc::new(EastmoneyClient::with_config(&config.http));
    let aggregator = StockDataAggregator::new(source)
        .with_sectors(SectorMap::load(&config.data.sector_file));

    match cli.command {
        Commands::Report { symbol, level, end } => {
            let level: ReportLevel = level.parse().map_err(anyhow::Error::msg)?;

            // 默认截止到明天、回看两年
            let end_date = match end {
                Some(end) => end,
                None => {
                    let today = Utc::now().with_timezone(&Shanghai).date_naive();
                    (today + Duration::days(1)).format("%Y-%m-%d").to_string()
                }
            };
            let end_naive =
                NaiveDate::parse_from_str(&end_date, "%Y-%m-%d").context("invalid end date")?;
            let start_date = (end_naive - Duration::days(365 * 2))
                .format("%Y-%m-%d")
                .to_string();

            let record = aggregator
                .fetch_record(&symbol, &start_date, &end_date)
                .await?;

            // 数据源没给名称时查本地名称表兜底
            let fallback_name = config
                .data
                .symbol_file
                .as_deref()
                .map(SymbolDirectory::load)
                .and_then(|directory| directory.lookup(&symbol).map(str::to_string));

            let opts = ReportOptions {
                fallback_name,
                now_ns: None,
            };
            println!("{}", build_stock_report(&record, level, &opts));
        }

        Commands::Kline {
            symbol,
            from,
            to,
            adjust,
        } => {
            let adjust: Adjust = adjust.parse().map_err(anyhow::Error::msg)?;
            let bars = aggregator.fetch_daily_bars(&symbol, &from, &to, adjust).await?;

            if bars.is_empty() {
                println!("未找到 {} 在 {} 至 {} 期间的数据。可能是非交易日或股票代码有误。", symbol, from, to);
            } else if from == to {
                println!("{}", render_kline_daily(&symbol, &from, adjust, &bars[0]));
            } else {
                println!("{}", render_kline_range(&symbol, &from, &to, adjust, &bars));
            }
        }

        Commands::List => {
            let listings = aggregator.fetch_symbol_list().await;
            info!("fetched {} symbols", listings.len());
            for listing in &listings {
                println!("{} {}", listing.symbol, listing.name);
            }
        }
    }

    Ok(())
}
