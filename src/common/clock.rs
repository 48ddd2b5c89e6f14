// src/common/clock.rs
// Conversões entre "HH:MM" e minutos desde a meia-noite.

use chrono::{NaiveTime, Timelike};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// "09:00:00" -> "09:00". Strings sem segundos passam intactas.
pub fn truncate_hhmm(value: &str) -> String {
    value.trim().splitn(3, ':').take(2).collect::<Vec<_>>().join(":")
}

/// Minutos desde a meia-noite. Aceita "24:00" como fim do dia.
pub fn parse_minutes(value: &str) -> Option<i64> {
    let value = truncate_hhmm(value);
    if value == "24:00" {
        return Some(MINUTES_PER_DAY);
    }
    NaiveTime::parse_from_str(&value, "%H:%M")
        .ok()
        .map(|t| i64::from(t.num_seconds_from_midnight() / 60))
}

pub fn format_minutes(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    let minutes = u32::try_from(minutes).ok()?;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_seconds() {
        assert_eq!(truncate_hhmm("09:30:00"), "09:30");
        assert_eq!(truncate_hhmm("18:00"), "18:00");
    }

    #[test]
    fn parses_and_formats() {
        assert_eq!(parse_minutes("10:45"), Some(645));
        assert_eq!(parse_minutes("10:45:59"), Some(645));
        assert_eq!(parse_minutes("24:00"), Some(1440));
        assert_eq!(parse_minutes("abc"), None);
        assert_eq!(format_minutes(645), "10:45");
        assert_eq!(format_minutes(0), "00:00");
    }

    #[test]
    fn time_from_minutes_rejects_out_of_day() {
        assert_eq!(time_from_minutes(90), NaiveTime::from_hms_opt(1, 30, 0));
        assert_eq!(time_from_minutes(1440), None);
        assert_eq!(time_from_minutes(-5), None);
    }
}
