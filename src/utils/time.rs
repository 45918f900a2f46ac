//! 时间与数值工具

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

/// 本地时区下的 (月份 1-12, 小时 0-23)
pub fn local_month_hour(now: DateTime<Utc>, tz: Tz) -> (u32, u32) {
    let local = now.with_timezone(&tz);
    (local.month(), local.hour())
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 格式化为 ISO 8601
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
