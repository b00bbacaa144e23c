//! 时间工具函数 - 业务时区转换
//!
//! 所有日期→时间戳转换统一在 API handler 层完成，
//! repository 层只接收 `i64` Unix millis。

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 本地零点 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地零点不存在 (夏令时跳跃)，取一小时后。
fn midnight_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .or_else(|| (naive + chrono::Duration::hours(1)).and_local_timezone(tz).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    midnight_millis(date, tz)
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    midnight_millis(next_day, tz)
}

/// `startDate` / `endDate` query pair → `[from, to)` millis
pub fn date_range_millis(
    start: Option<&str>,
    end: Option<&str>,
    tz: Tz,
) -> AppResult<(Option<i64>, Option<i64>)> {
    let start = start.map(parse_date).transpose()?;
    let end = end.map(parse_date).transpose()?;
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(AppError::validation(format!(
            "startDate {} is after endDate {}",
            s, e
        )));
    }
    Ok((
        start.map(|d| day_start_millis(d, tz)),
        end.map(|d| day_end_millis(d, tz)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAO_PAULO: Tz = chrono_tz::America::Sao_Paulo;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2025-03-10").is_ok());
        assert!(parse_date("10/03/2025").is_err());
    }

    #[test]
    fn test_day_bounds_in_business_timezone() {
        let date = parse_date("2025-03-10").unwrap();
        // São Paulo is UTC-3 (no DST since 2019)
        assert_eq!(day_start_millis(date, SAO_PAULO), 1_741_575_600_000);
        assert_eq!(
            day_end_millis(date, SAO_PAULO) - day_start_millis(date, SAO_PAULO),
            shared::util::DAY_MILLIS
        );
    }

    #[test]
    fn test_date_range() {
        let (from, to) = date_range_millis(Some("2025-03-10"), Some("2025-03-10"), SAO_PAULO).unwrap();
        assert_eq!(to.unwrap() - from.unwrap(), shared::util::DAY_MILLIS);

        let (from, to) = date_range_millis(None, None, SAO_PAULO).unwrap();
        assert!(from.is_none() && to.is_none());

        assert!(date_range_millis(Some("2025-03-11"), Some("2025-03-10"), SAO_PAULO).is_err());
    }
}
