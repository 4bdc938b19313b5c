use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub fn expires_at(ttl_seconds: i64) -> i64 {
    now_millis() + ttl_seconds.max(0) * 1000
}

pub fn ttl_duration(ttl_seconds: i64) -> Duration {
    Duration::from_secs(ttl_seconds.max(0) as u64)
}

/// Seconds remaining until `expires_at_millis`, floored at zero.
pub fn seconds_until(expires_at_millis: i64) -> i64 {
    ((expires_at_millis - now_millis()) / 1000).max(0)
}
