//! 技术指标适配层。
//!
//! 指标数值本身交给 ta 库计算，这里只做两件事：
//! 把多路输出整理成报告需要的序列形状，以及统一预热期语义 ——
//! ta 库从第一个输入就开始给出播种值，而报告要求预热期内显示 `N/A`，
//! 所以各指标在首个有效索引之前一律置 `None`。
//!
//! # 支持指标
//!
//! - **KDJ**: 快速随机指标经两次简单移动平均得到 K/D，J = 3K - 2D
//! - **MACD**: DIF（快慢线差）与 DEA（信号线）
//! - **RSI**: 相对强弱指数
//! - **布林带**: 上/中/下轨
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use cnstock_research::indicators::{IndicatorEngine, KdjParams};
//!
//! let engine = IndicatorEngine::new();
//! let kdj = engine.kdj(&high, &low, &close, KdjParams::default())?;
//! assert!(kdj.k[0].is_none()); // 预热期
//! ```

use ta::indicators::{
    BollingerBands, FastStochastic, MovingAverageConvergenceDivergence, RelativeStrengthIndex,
    SimpleMovingAverage,
};
use ta::Next;
use thiserror::Error;

/// 指标计算错误。
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 参数不合法（如周期为 0）
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// 指标计算结果类型。
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// KDJ 参数。
#[derive(Debug, Clone, Copy)]
pub struct KdjParams {
    /// 随机指标回看周期（默认 9）
    pub n: usize,
    /// K 平滑周期（默认 3）
    pub m1: usize,
    /// D 平滑周期（默认 3）
    pub m2: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self { n: 9, m1: 3, m2: 3 }
    }
}

/// MACD 参数。
#[derive(Debug, Clone, Copy)]
pub struct MacdParams {
    /// 快线周期（默认 12）
    pub fast: usize,
    /// 慢线周期（默认 26）
    pub slow: usize,
    /// 信号线周期（默认 9）
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// RSI 参数。
#[derive(Debug, Clone, Copy)]
pub struct RsiParams {
    /// 回看周期（默认 14）
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 布林带参数。
#[derive(Debug, Clone, Copy)]
pub struct BollParams {
    /// 回看周期（默认 20）
    pub period: usize,
    /// 标准差倍数（默认 2.0）
    pub multiplier: f64,
}

impl Default for BollParams {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
        }
    }
}

/// KDJ 序列。
#[derive(Debug, Clone)]
pub struct KdjSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
    pub j: Vec<Option<f64>>,
}

/// MACD 序列。
#[derive(Debug, Clone)]
pub struct MacdSeries {
    /// 快慢线差 (DIF)
    pub dif: Vec<Option<f64>>,
    /// 信号线 (DEA)
    pub dea: Vec<Option<f64>>,
}

/// 布林带序列。
#[derive(Debug, Clone)]
pub struct BollSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// 高低收三元组，ta 库随机指标的输入。
struct HlcBar {
    high: f64,
    low: f64,
    close: f64,
}

impl ta::High for HlcBar {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for HlcBar {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for HlcBar {
    fn close(&self) -> f64 {
        self.close
    }
}

/// 统一指标引擎。
///
/// 数据长度不足不报错：预热期之前的位置输出 `None`，由上层渲染为 `N/A`。
#[derive(Debug, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// 创建指标引擎。
    pub fn new() -> Self {
        Self
    }

    /// 计算 KDJ。
    ///
    /// K = SMA(m1, 快速随机值)，D = SMA(m2, K)，J = 3K - 2D。
    /// K 从索引 `n + m1 - 2` 起有效，D 从 `n + m1 + m2 - 3` 起有效。
    pub fn kdj(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        params: KdjParams,
    ) -> IndicatorResult<KdjSeries> {
        let mut fast = FastStochastic::new(params.n)
            .map_err(|e| IndicatorError::InvalidParameter(e.to_string()))?;
        let mut k_smooth = SimpleMovingAverage::new(params.m1)
            .map_err(|e| IndicatorError::InvalidParameter(e.to_string()))?;
        let mut d_smooth = SimpleMovingAverage::new(params.m2)
            .map_err(|e| IndicatorError::InvalidParameter(e.to_string()))?;

        let len = high.len().min(low.len()).min(close.len());
        let k_first = params.n + params.m1 - 2;
        let d_first = params.n + params.m1 + params.m2 - 3;

        let mut series = KdjSeries {
            k: Vec::with_capacity(len),
            d: Vec::with_capacity(len),
            j: Vec::with_capacity(len),
        };
        for i in 0..len {
            let bar = HlcBar {
                high: high[i],
                low: low[i],
                close: close[i],
            };
            let fast_k = fast.next(&bar);
            let k = k_smooth.next(fast_k);
            let d = d_smooth.next(k);

            let k = if i >= k_first { Some(k) } else { None };
            let d = if i >= d_first { Some(d) } else { None };
            let j = match (k, d) {
                (Some(k), Some(d)) => Some(3.0 * k - 2.0 * d),
                _ => None,
            };
            series.k.push(k);
            series.d.push(d);
            series.j.push(j);
        }
        Ok(series)
    }

    /// 计算 MACD 的 DIF 与 DEA。
    ///
    /// DIF 从索引 `slow - 1` 起有效，DEA 从 `slow + signal - 2` 起有效。
    pub fn macd(&self, close: &[f64], params: MacdParams) -> IndicatorResult<MacdSeries> {
        let mut macd =
            MovingAverageConvergenceDivergence::new(params.fast, params.slow, params.signal)
                .map_err(|e| IndicatorError::InvalidParameter(e.to_string()))?;

        let dif_first = params.slow - 1;
        let dea_first = params.slow + params.signal - 2;

        let mut series = MacdSeries {
            dif: Vec::with_capacity(close.len()),
            dea: Vec::with_capacity(close.len()),
        };
        for (i, &price) in close.iter().enumerate() {
            let output = macd.next(price);
            series
                .dif
                .push(if i >= dif_first { Some(output.macd) } else { None });
            series
                .dea
                .push(if i >= dea_first { Some(output.signal) } else { None });
        }
        Ok(series)
    }

    /// 计算 RSI，从索引 `period` 起有效。
    pub fn rsi(&self, close: &[f64], params: RsiParams) -> IndicatorResult<Vec<Option<f64>>> {
        let mut rsi = RelativeStrengthIndex::new(params.period)
            .map_err(|e| IndicatorError::InvalidParameter(e.to_string()))?;

        Ok(close
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                let value = rsi.next(price);
                if i >= params.period {
                    Some(value)
                } else {
                    None
                }
            })
            .collect())
    }

    /// 计算布林带，从索引 `period - 1` 起有效。
    pub fn bollinger(&self, close: &[f64], params: BollParams) -> IndicatorResult<BollSeries> {
        let mut bands = BollingerBands::new(params.period, params.multiplier)
            .map_err(|e| IndicatorError::InvalidParameter(e.to_string()))?;

        let first = params.period.saturating_sub(1);
        let mut series = BollSeries {
            upper: Vec::with_capacity(close.len()),
            middle: Vec::with_capacity(close.len()),
            lower: Vec::with_capacity(close.len()),
        };
        for (i, &price) in close.iter().enumerate() {
            let output = bands.next(price);
            if i >= first {
                series.upper.push(Some(output.upper));
                series.middle.push(Some(output.average));
                series.lower.push(Some(output.lower));
            } else {
                series.upper.push(None);
                series.middle.push(None);
                series.lower.push(None);
            }
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series(len: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        // 简单的锯齿上行序列，保证高低收关系成立
        let close: Vec<f64> = (0..len)
            .map(|i| 100.0 + i as f64 * 0.5 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();
        (high, low, close)
    }

    #[test]
    fn test_kdj_warmup() {
        let (high, low, close) = sample_series(40);
        let engine = IndicatorEngine::new();
        let kdj = engine.kdj(&high, &low, &close, KdjParams::default()).unwrap();

        assert_eq!(kdj.k.len(), 40);
        // K 从索引 10 起有效，D 从索引 12 起有效
        assert!(kdj.k[9].is_none());
        assert!(kdj.k[10].is_some());
        assert!(kdj.d[11].is_none());
        assert!(kdj.d[12].is_some());
        // J 在 K/D 都有效前为 None
        assert!(kdj.j[11].is_none());
        assert!(kdj.j[12].is_some());
    }

    #[test]
    fn test_kdj_j_relation() {
        let (high, low, close) = sample_series(40);
        let engine = IndicatorEngine::new();
        let kdj = engine.kdj(&high, &low, &close, KdjParams::default()).unwrap();

        for i in 12..40 {
            let (k, d, j) = (kdj.k[i].unwrap(), kdj.d[i].unwrap(), kdj.j[i].unwrap());
            assert!((j - (3.0 * k - 2.0 * d)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_macd_warmup() {
        let (_, _, close) = sample_series(40);
        let engine = IndicatorEngine::new();
        let macd = engine.macd(&close, MacdParams::default()).unwrap();

        assert!(macd.dif[24].is_none());
        assert!(macd.dif[25].is_some());
        assert!(macd.dea[32].is_none());
        assert!(macd.dea[33].is_some());
    }

    #[test]
    fn test_rsi_warmup_and_range() {
        let (_, _, close) = sample_series(40);
        let engine = IndicatorEngine::new();
        let rsi = engine.rsi(&close, RsiParams { period: 6 }).unwrap();

        assert!(rsi[5].is_none());
        assert!(rsi[6].is_some());
        for value in rsi.iter().flatten() {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
    }

    #[test]
    fn test_bollinger_warmup_and_order() {
        let (_, _, close) = sample_series(40);
        let engine = IndicatorEngine::new();
        let boll = engine.bollinger(&close, BollParams::default()).unwrap();

        assert!(boll.upper[18].is_none());
        assert!(boll.upper[19].is_some());
        for i in 19..40 {
            let (upper, middle, lower) = (
                boll.upper[i].unwrap(),
                boll.middle[i].unwrap(),
                boll.lower[i].unwrap(),
            );
            assert!(upper >= middle && middle >= lower);
        }
    }

    #[test]
    fn test_short_input_is_all_none() {
        // 数据不足不报错，预热期内全部为 None
        let (_, _, close) = sample_series(5);
        let engine = IndicatorEngine::new();
        let rsi = engine.rsi(&close, RsiParams { period: 14 }).unwrap();
        assert_eq!(rsi.len(), 5);
        assert!(rsi.iter().all(Option::is_none));
    }

    #[test]
    fn test_invalid_params() {
        let (_, _, close) = sample_series(10);
        let engine = IndicatorEngine::new();
        assert!(engine.rsi(&close, RsiParams { period: 0 }).is_err());
    }
}
