use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English name of a 1-based month; `None` outside 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Calendar fields derived from a date, used as hierarchy keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeParts {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    /// 1..=4, `ceil(month / 3)`
    pub quarter: u32,
}

impl TimeParts {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        TimeParts {
            year: date.year(),
            month,
            quarter: month.div_ceil(3),
        }
    }

    pub fn quarter_name(&self) -> String {
        format!("Q{}", self.quarter)
    }

    /// Empty for a hand-built value whose month is out of range.
    pub fn month_name(&self) -> &'static str {
        month_name(self.month).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarters_follow_month_ceiling() {
        let quarters: Vec<u32> = (1..=12)
            .map(|m| TimeParts::from_date(NaiveDate::from_ymd_opt(2023, m, 1).unwrap()).quarter)
            .collect();
        assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn names_are_english_and_fixed() {
        let parts = TimeParts::from_date(NaiveDate::from_ymd_opt(2024, 8, 19).unwrap());
        assert_eq!(parts.year, 2024);
        assert_eq!(parts.quarter_name(), "Q3");
        assert_eq!(parts.month_name(), "August");
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(month_name(12), Some("December"));
    }

    #[test]
    fn out_of_range_month_has_empty_name() {
        let parts = TimeParts {
            year: 2023,
            month: 0,
            quarter: 0,
        };
        assert_eq!(parts.month_name(), "");
        assert_eq!(TimeParts { month: 13, ..parts }.month_name(), "");
    }
}
