// libs/scheduling-cell/src/services/time.rs
use chrono::NaiveTime;
use regex::Regex;
use std::sync::LazyLock;

/// 24-hour clock, one- or two-digit hour, always two-digit minutes.
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").expect("valid time regex"));

pub struct TimeValidator;

impl TimeValidator {
    pub fn is_valid_time(value: &str) -> bool {
        TIME_PATTERN.is_match(value)
    }

    /// Both ends valid and `start` strictly before `end` on the same day.
    pub fn is_valid_range(start: &str, end: &str) -> bool {
        match (Self::parse_time(start), Self::parse_time(end)) {
            (Some(start), Some(end)) => start < end,
            _ => false,
        }
    }

    pub fn parse_time(value: &str) -> Option<NaiveTime> {
        let captures = TIME_PATTERN.captures(value)?;
        let hour = captures[1].parse().ok()?;
        let minute = captures[2].parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_digit_hours() {
        assert!(TimeValidator::is_valid_time("9:05"));
        assert_eq!(
            TimeValidator::parse_time("9:05"),
            NaiveTime::from_hms_opt(9, 5, 0)
        );
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        assert!(!TimeValidator::is_valid_time(" 09:00"));
        assert!(!TimeValidator::is_valid_time("09:00\n"));
    }
}
