use crate::util::now_ms;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Human-relative label for an epoch-millisecond timestamp, measured against
/// `now_ms`. Anything a week or older gets a calendar date.
pub fn format_timestamp(ts_ms: Option<i64>, now_ms: i64) -> String {
    let Some(ts) = ts_ms else {
        return String::new();
    };

    // Clock skew can put fresh server stamps slightly in the future.
    let diff = now_ms.saturating_sub(ts);
    if diff < MINUTE_MS {
        "Just now".to_string()
    } else if diff < HOUR_MS {
        format!("{}m ago", diff / MINUTE_MS)
    } else if diff < DAY_MS {
        format!("{}h ago", diff / HOUR_MS)
    } else if diff < 7 * DAY_MS {
        format!("{}d ago", diff / DAY_MS)
    } else {
        calendar_date(ts)
    }
}

pub fn format_timestamp_now(ts_ms: Option<i64>) -> String {
    format_timestamp(ts_ms, now_ms())
}

#[cfg(target_arch = "wasm32")]
fn calendar_date(ts_ms: i64) -> String {
    let d = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(ts_ms as f64));
    d.to_locale_date_string("default", &wasm_bindgen::JsValue::UNDEFINED)
        .into()
}

#[cfg(not(target_arch = "wasm32"))]
fn calendar_date(ts_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_ms)
        .map(|d| d.format("%-m/%-d/%Y").to_string())
        .unwrap_or_default()
}
