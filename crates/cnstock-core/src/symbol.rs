//! 股票代码转换与品种判别。
//!
//! 内部统一使用 `"SH600000"` / `"SZ000001"` 形式的规范代码，
//! 行情接口使用 `(六位数字代码, 市场标志)` 的组合。
//! 两个方向的转换都是尽力而为，不会因为格式异常而失败。

/// 交易所市场。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// 上海证券交易所
    Sh,
    /// 深圳证券交易所
    Sz,
    /// 无法识别的市场
    Unknown,
}

impl Market {
    /// 行情接口使用的市场标志。
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Sz => "sz",
            Self::Unknown => "",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sh => write!(f, "SH"),
            Self::Sz => write!(f, "SZ"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// 根据数字代码首位推断市场。
///
/// 沿用行情代码的历史映射：`'6'` 开头为沪市，其余数字开头为深市。
/// 首位不是数字时返回 [`Market::Unknown`]，由调用方决定兜底策略。
pub fn infer_market(code: &str) -> Market {
    match code.chars().next() {
        Some('6') => Market::Sh,
        Some(c) if c.is_ascii_digit() => Market::Sz,
        _ => Market::Unknown,
    }
}

/// 将规范代码转换为行情接口格式。
///
/// `"SH600000"` -> `("600000", Market::Sh)`，`"SZ000001"` -> `("000001", Market::Sz)`。
/// 没有交易所前缀时按首位数字推断；不校验代码长度，异常输入原样透传。
pub fn to_provider_code(symbol: &str) -> (String, Market) {
    if let Some(code) = symbol.strip_prefix("SH") {
        (code.to_string(), Market::Sh)
    } else if let Some(code) = symbol.strip_prefix("SZ") {
        (code.to_string(), Market::Sz)
    } else {
        (symbol.to_string(), infer_market(symbol))
    }
}

/// 将行情接口格式转换为规范代码。
///
/// `("600000", "sh")` -> `"SH600000"`。
/// 市场标志为 `"sh"` 或 `"1"`（忽略大小写）时归入沪市，为空时按首位数字推断，
/// 其余情况归入深市。
pub fn from_provider_code(code: &str, market: &str) -> String {
    let prefix = if market.is_empty() {
        match infer_market(code) {
            Market::Sz | Market::Unknown => "SZ",
            Market::Sh => "SH",
        }
    } else if market.eq_ignore_ascii_case("sh") || market == "1" {
        "SH"
    } else {
        "SZ"
    };
    format!("{}{}", prefix, code)
}

/// 判断规范代码是否为个股（而非指数、基金或 ETF）。
///
/// 沪市 `SH6*`、深市主板 `SZ00*`、创业板 `SZ30*` 视为个股。
pub fn is_stock(symbol: &str) -> bool {
    symbol.starts_with("SH6") || symbol.starts_with("SZ00") || symbol.starts_with("SZ30")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_provider_code() {
        assert_eq!(to_provider_code("SH600000"), ("600000".to_string(), Market::Sh));
        assert_eq!(to_provider_code("SZ300750"), ("300750".to_string(), Market::Sz));
        // 无前缀时按首位推断
        assert_eq!(to_provider_code("600000"), ("600000".to_string(), Market::Sh));
        assert_eq!(to_provider_code("000001"), ("000001".to_string(), Market::Sz));
    }

    #[test]
    fn test_to_provider_code_malformed() {
        // 异常输入不报错，市场标记为 Unknown
        let (code, market) = to_provider_code("XX12345");
        assert_eq!(code, "XX12345");
        assert_eq!(market, Market::Unknown);
    }

    #[test]
    fn test_from_provider_code() {
        assert_eq!(from_provider_code("600000", "sh"), "SH600000");
        assert_eq!(from_provider_code("600000", "SH"), "SH600000");
        assert_eq!(from_provider_code("600000", "1"), "SH600000");
        assert_eq!(from_provider_code("000001", "sz"), "SZ000001");
        assert_eq!(from_provider_code("000001", "0"), "SZ000001");
        // 市场为空时按首位推断
        assert_eq!(from_provider_code("600000", ""), "SH600000");
        assert_eq!(from_provider_code("300750", ""), "SZ300750");
    }

    #[test]
    fn test_round_trip() {
        for symbol in ["SH600000", "SZ000001", "SZ300750"] {
            let (code, market) = to_provider_code(symbol);
            assert_eq!(from_provider_code(&code, market.as_str()), symbol);
        }
    }

    #[test]
    fn test_is_stock() {
        assert!(is_stock("SH600000"));
        assert!(is_stock("SZ000001"));
        assert!(is_stock("SZ300750"));
        // 指数
        assert!(!is_stock("SH000001"));
        assert!(!is_stock("SZ399001"));
        // 基金/ETF
        assert!(!is_stock("SH510050"));
        assert!(!is_stock("SZ159919"));
    }
}
