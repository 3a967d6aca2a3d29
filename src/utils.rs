use chrono::{DateTime, Local, Utc};

pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Time elapsed since `launch_time`, e.g. "3h 12m 5s"
pub fn format_runtime(launch_time: Option<DateTime<Utc>>) -> Option<String> {
    launch_time.map(|lt| {
        let duration = Utc::now().signed_duration_since(lt);
        format_duration(duration.num_seconds().max(0) as u64)
    })
}

/// Local wall-clock time, or "-" when absent
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|ts| {
            ts.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

/// Dollars per hour with enough precision for spot prices
pub fn format_price(price: f64) -> String {
    format!("${:.4}", price)
}

/// EC2 price strings such as "0.031200"
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}
