//! 股票名称表。
//!
//! 规范代码到显示名称的本地映射。数据源快照里拿不到名称时，
//! 报告层用它做兜底查询。可以从股票列表构建，也可以从
//! `{"SH600000": "浦发银行"}` 形式的 JSON 文件加载。

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

/// 股票名称表。
#[derive(Debug, Clone, Default)]
pub struct SymbolDirectory {
    names: HashMap<String, String>,
}

impl SymbolDirectory {
    /// 创建空名称表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `(规范代码, 名称)` 列表构建。
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            names: entries.into_iter().collect(),
        }
    }

    /// 从 JSON 文件加载，失败时返回空表。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
        {
            Some(names) => Self { names },
            None => {
                warn!(path = %path.display(), "股票名称表加载失败");
                Self::default()
            }
        }
    }

    /// 查询名称。
    pub fn lookup(&self, symbol: &str) -> Option<&str> {
        self.names.get(symbol).map(String::as_str)
    }

    /// 收录数量。
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
