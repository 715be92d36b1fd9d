//! 原始标量清洗。
//!
//! 上游行情表格的数值列格式很不统一：可能是数字、带 `%` 的字符串、
//! 带 `亿`/`万` 单位后缀的字符串，也可能用 `"-"`/`"--"`/空串表示缺失。
//! 这里提供统一的清洗入口，把它们转成 f64 和纳秒时间戳。
//!
//! # 百分比约定
//!
//! 带 `%` 的值去掉百分号后按"百分点"保存（`"24.00%"` -> `24.0`），
//! 所有百分比字段（ROE、资金流向占比等）都遵循同一约定，
//! 渲染时直接补 `%` 即可，不再除以或乘以 100。

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// 清洗任意 JSON 标量为 f64，永不失败。
///
/// null -> 0.0；数字直接取值（NaN 归零）；字符串走 [`parse_numeric_str`]；
/// 其余形态一律归零。
pub fn parse_numeric(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Number(n) => {
            let v = n.as_f64().unwrap_or(0.0);
            if v.is_nan() {
                0.0
            } else {
                v
            }
        }
        Value::String(s) => parse_numeric_str(s),
        _ => 0.0,
    }
}

/// 清洗数值字符串为 f64，永不失败。
///
/// 空串、`"-"`、`"--"` -> 0.0；去掉末尾 `%`；`亿` 乘 1e8、`万` 乘 1e4
/// （先查 `亿` 再查 `万`，至多消费一个单位后缀）；剩余部分按浮点字面量解析，
/// 解析失败返回 0.0。
pub fn parse_numeric_str(s: &str) -> f64 {
    let mut s = s.trim();
    if s.is_empty() || s == "-" || s == "--" {
        return 0.0;
    }

    if let Some(stripped) = s.strip_suffix('%') {
        s = stripped;
    }

    let mut multiplier = 1.0;
    if let Some(stripped) = s.strip_suffix('亿') {
        s = stripped;
        multiplier = 1e8;
    } else if let Some(stripped) = s.strip_suffix('万') {
        s = stripped;
        multiplier = 1e4;
    }

    s.trim().parse::<f64>().map(|v| v * multiplier).unwrap_or(0.0)
}

/// 把日期值转换为纳秒时间戳。
///
/// 数字视为已经是纳秒时间戳直接透传；字符串走 [`parse_date_str_ns`]；
/// 其余形态报 [`CoreError::InvalidDate`]。
pub fn parse_date_ns(value: &Value) -> CoreResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CoreError::InvalidDate(n.to_string())),
        Value::String(s) => parse_date_str_ns(s),
        other => Err(CoreError::InvalidDate(other.to_string())),
    }
}

/// 把日期字符串转换为纳秒时间戳。
///
/// 截取前 10 个字符按 `YYYY-MM-DD` 解析（`"2024-01-02 00:00:00"` 这类
/// 带时间的值也能处理），锚定到 Asia/Shanghai 当日零点。
/// 这是清洗层唯一可能失败的操作。
pub fn parse_date_str_ns(s: &str) -> CoreResult<i64> {
    let head: String = s.trim().chars().take(10).collect();
    let date = NaiveDate::parse_from_str(&head, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(s.to_string()))?;
    let dt = Shanghai
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .ok_or_else(|| CoreError::InvalidDate(s.to_string()))?;
    dt.timestamp_nanos_opt()
        .ok_or_else(|| CoreError::InvalidDate(s.to_string()))
}

/// 纳秒时间戳转 Asia/Shanghai 时间。
pub fn ns_to_datetime(ns: i64) -> DateTime<Tz> {
    Utc.timestamp_nanos(ns).with_timezone(&Shanghai)
}

/// 纳秒时间戳转 `YYYY-MM-DD` 字符串。
pub fn ns_to_date_string(ns: i64) -> String {
    ns_to_datetime(ns).format("%Y-%m-%d").to_string()
}
