/// Milliseconds in one day
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Ids are strictly increasing within a process.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    use std::sync::atomic::{AtomicI64, Ordering};

    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    static LAST: AtomicI64 = AtomicI64::new(0);

    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    let candidate = (ts << 12) | rand_bits;

    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(last + 1);
        match LAST.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Whole days from `now` until `target`, rounded up.
///
/// 1 ms left counts as one day; a target at or before `now` yields 0 or less.
pub fn ceil_days_until(target: i64, now: i64) -> i64 {
    let delta = target - now;
    if delta <= 0 {
        return delta.div_euclid(DAY_MILLIS);
    }
    (delta + DAY_MILLIS - 1) / DAY_MILLIS
}

/// Canonical form of a scanned or typed code: trimmed, upper-case
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_ids_are_positive_and_increase() {
        let a = snowflake_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = snowflake_id();
        assert!(a > 0);
        assert!(b > a);
    }

    #[test]
    fn test_snowflake_ids_are_unique_in_a_burst() {
        let ids: std::collections::HashSet<i64> = (0..10_000).map(|_| snowflake_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_ceil_days_until() {
        let now = 1_000_000_000;
        assert_eq!(ceil_days_until(now + 1, now), 1);
        assert_eq!(ceil_days_until(now + DAY_MILLIS, now), 1);
        assert_eq!(ceil_days_until(now + DAY_MILLIS + 1, now), 2);
        assert_eq!(ceil_days_until(now + 3 * DAY_MILLIS - 5_000, now), 3);
        assert_eq!(ceil_days_until(now, now), 0);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  ped-7f3k2q \n"), "PED-7F3K2Q");
        assert_eq!(normalize_code("   "), "");
    }
}
