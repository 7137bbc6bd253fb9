pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Price label: at most two decimals, trailing zeros dropped.
pub(crate) fn format_price(price: f64) -> String {
    let s = format!("{:.2}", price);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
