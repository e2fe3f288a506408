use chrono::{DateTime, Utc};
use exam_core::time::format_hms;

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Remaining exam time as `HH:MM:SS`.
#[must_use]
pub fn format_timer(remaining_secs: u32) -> String {
    format_hms(remaining_secs)
}

/// Average score with two decimals, or a dash when there are no attempts.
#[must_use]
pub fn format_average(average: Option<f64>) -> String {
    average.map_or_else(|| "-".to_owned(), |avg| format!("{avg:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;

    #[test]
    fn formats_attempt_time_to_the_minute() {
        assert_eq!(format_datetime(fixed_now()), "2023-11-14 22:13");
    }

    #[test]
    fn timer_and_average() {
        assert_eq!(format_timer(3_725), "01:02:05");
        assert_eq!(format_average(Some(16.0 / 3.0)), "5.33");
        assert_eq!(format_average(None), "-");
    }
}
