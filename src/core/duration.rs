use regex::Regex;
use std::sync::OnceLock;

/// 無法解析的 duration 一律視為超過任何上限 (fail closed)
pub const UNPARSEABLE_DURATION_HOURS: f64 = f64::INFINITY;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // P[nD][T[nH][nM][nS]]，T 之後至少要有一個時間欄位
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("duration pattern is a valid regex")
    })
}

/// 將 ISO-8601 duration (例如 `PT2H30M`、`P1DT3H`) 轉換為小時數
pub fn parse_duration_hours(input: &str) -> Option<f64> {
    let input = input.trim();
    let caps = duration_pattern().captures(input)?;

    // "P"、"PT"、"P1DT" 這類沒有實際欄位的字串不合法
    if caps.iter().skip(1).all(|c| c.is_none()) || input.ends_with('T') {
        return None;
    }

    let component = |idx: usize| -> Option<f64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse::<u64>().ok().map(|v| v as f64),
            None => Some(0.0),
        }
    };

    let days = component(1)?;
    let hours = component(2)?;
    let minutes = component(3)?;
    let seconds = component(4)?;

    Some(days * 24.0 + hours + minutes / 60.0 + seconds / 3600.0)
}

pub fn duration_hours(input: &str) -> f64 {
    parse_duration_hours(input).unwrap_or(UNPARSEABLE_DURATION_HOURS)
}
