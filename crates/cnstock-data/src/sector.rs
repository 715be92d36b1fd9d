//! 本地板块映射。
//!
//! 行情接口的板块查询偶尔不可用，本地维护一份
//! `规范代码 -> 板块列表` 的 JSON 配置作为兜底：
//!
//! ```json
//! { "SH600000": ["银行", "上海板块"], "SZ300750": ["电池", "创业板综"] }
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::{error, warn};

/// 股票板块映射。
#[derive(Debug, Clone, Default)]
pub struct SectorMap {
    map: HashMap<String, Vec<String>>,
}

impl SectorMap {
    /// 创建空映射。
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 配置文件加载。
    ///
    /// 文件不存在或解析失败时记录日志并返回空映射，不会让调用方失败。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                warn!(path = %path.display(), "板块配置文件不存在");
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(map) => Self { map },
            Err(err) => {
                error!(path = %path.display(), %err, "板块配置文件解析失败");
                Self::default()
            }
        }
    }

    /// 查询某个代码的板块列表，未收录时返回空。
    pub fn get(&self, symbol: &str) -> &[String] {
        self.map.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 收录的代码数量。
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for SectorMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let map: SectorMap = [(
            "SH600000".to_string(),
            vec!["银行".to_string(), "上海板块".to_string()],
        )]
        .into_iter()
        .collect();

        assert_eq!(map.get("SH600000"), &["银行", "上海板块"]);
        assert!(map.get("SZ000001").is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let map = SectorMap::load("/nonexistent/sector.json");
        assert!(map.is_empty());
    }
}
