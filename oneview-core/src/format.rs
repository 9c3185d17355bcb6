//! Display helpers for KPI values, goal progress and missing data.
//!
//! Missing values render as [`PLACEHOLDER`] so tables stay aligned when a
//! ratio is undefined or a target is unset.

/// Rendered in place of a missing or undefined value.
pub const PLACEHOLDER: &str = "—";

/// Format as whole US dollars, e.g. `$45,000`.
pub fn format_currency(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => {
            let rounded = v.round();
            let sign = if rounded < 0.0 { "-" } else { "" };
            format!("{sign}${}", group_thousands(rounded.abs() as u64))
        }
        None => PLACEHOLDER.to_string(),
    }
}

/// Format with thousands separators and up to three fraction digits.
pub fn format_number(value: Option<f64>) -> String {
    let Some(v) = finite(value) else {
        return PLACEHOLDER.to_string();
    };

    let scaled = (v.abs() * 1000.0).round() as u64;
    let whole = scaled / 1000;
    let frac = scaled % 1000;
    let sign = if v < 0.0 && scaled > 0 { "-" } else { "" };

    if frac == 0 {
        format!("{sign}{}", group_thousands(whole))
    } else {
        let digits = format!("{frac:03}");
        format!(
            "{sign}{}.{}",
            group_thousands(whole),
            digits.trim_end_matches('0')
        )
    }
}

/// Format a percentage with a fixed number of decimals, e.g. `87.5%`.
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(v) => format!("{v:.decimals$}%"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format hours with one decimal, e.g. `7.5h`.
pub fn format_hours(hours: Option<f64>) -> String {
    match finite(hours) {
        Some(h) => format!("{h:.1}h"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a call duration as `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Percent of target reached, uncapped, or the placeholder without a target.
pub fn format_goal_progress(current: f64, target: Option<f64>) -> String {
    match target.filter(|t| *t != 0.0) {
        Some(t) => format_percent(Some(current / t * 100.0), 0),
        None => PLACEHOLDER.to_string(),
    }
}

/// Progress toward a target for progress bars, capped at 100.
///
/// Returns 0 when no target is set.
pub fn calculate_progress(current: f64, target: Option<f64>) -> f64 {
    match target.filter(|t| *t != 0.0) {
        Some(t) => (current / t * 100.0).min(100.0),
        None => 0.0,
    }
}

/// Division that yields `None` instead of NaN or infinity.
pub fn safe_divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Format a ratio with fixed decimals, or the placeholder for a zero denominator.
pub fn format_ratio(numerator: f64, denominator: f64, decimals: usize) -> String {
    match safe_divide(numerator, denominator) {
        Some(v) => format!("{v:.decimals$}"),
        None => PLACEHOLDER.to_string(),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Some(45000.0)), "$45,000");
        assert_eq!(format_currency(Some(1234567.6)), "$1,234,568");
        assert_eq!(format_currency(Some(0.0)), "$0");
        assert_eq!(format_currency(Some(-950.0)), "-$950");
        assert_eq!(format_currency(None), "—");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(2100.0)), "2,100");
        assert_eq!(format_number(Some(1234.5)), "1,234.5");
        assert_eq!(format_number(Some(0.12345)), "0.123");
        assert_eq!(format_number(Some(f64::NAN)), "—");
    }

    #[test]
    fn test_format_percent_and_hours() {
        assert_eq!(format_percent(Some(87.456), 1), "87.5%");
        assert_eq!(format_percent(None, 1), "—");
        assert_eq!(format_hours(Some(7.26)), "7.3h");
        assert_eq!(format_hours(None), "—");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(185), "3:05");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn test_goal_progress() {
        assert_eq!(format_goal_progress(150.0, Some(200.0)), "75%");
        assert_eq!(format_goal_progress(300.0, Some(200.0)), "150%");
        assert_eq!(format_goal_progress(10.0, Some(0.0)), "—");
        assert_eq!(format_goal_progress(10.0, None), "—");
        assert_eq!(calculate_progress(300.0, Some(200.0)), 100.0);
        assert_eq!(calculate_progress(50.0, Some(200.0)), 25.0);
        assert_eq!(calculate_progress(50.0, None), 0.0);
    }

    #[test]
    fn test_safe_divide() {
        assert_eq!(safe_divide(10.0, 4.0), Some(2.5));
        assert_eq!(safe_divide(10.0, 0.0), None);
        assert_eq!(safe_divide(0.0, 0.0), None);
        assert_eq!(format_ratio(10.0, 3.0, 1), "3.3");
        assert_eq!(format_ratio(10.0, 0.0, 1), "—");
    }
}
