use chrono::{TimeZone, Utc};

/// 当前Unix时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 毫秒时间戳与当前时间的差值（秒），时间戳在未来时返回0
pub fn age_seconds(timestamp_ms: i64) -> u64 {
    let delta_ms = now_millis() - timestamp_ms;
    if delta_ms <= 0 {
        0
    } else {
        (delta_ms / 1000) as u64
    }
}

/// 将毫秒级时间戳格式化为UTC时间字符串，便于日志输出
pub fn mill_time_to_datetime(timestamp_ms: i64) -> Result<String, String> {
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => {
            Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        chrono::LocalResult::None => Err("Invalid timestamp: None".to_string()),
        chrono::LocalResult::Ambiguous(_, _) => Err("Invalid timestamp: Ambiguous".to_string()),
    }
}
