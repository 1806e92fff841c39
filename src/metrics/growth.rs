use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::time::month_name;
use crate::data::model::{Measure, TransactionSet};

/// Month-over-month comparison of a measure.
///
/// Months are compared by calendar month number only; the year is ignored.
/// When the latest month is January the "previous" month is 0, which never
/// matches, so no growth is reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOverMonth {
    pub current_month: u32,
    pub previous_month: u32,
    pub current: f64,
    pub previous: f64,
    pub growth_pct: f64,
}

fn month_total(set: &TransactionSet, month: u32, measure: Measure) -> f64 {
    set.iter()
        .filter(|t| t.date.month() == month)
        .map(|t| t.measure(measure))
        .sum()
}

/// Compare the highest month number present against the one before it.
///
/// Returns `None` for an empty set, or when the previous month sums to
/// exactly zero.
pub fn month_over_month(set: &TransactionSet, measure: Measure) -> Option<MonthOverMonth> {
    let current_month = set.iter().map(|t| t.date.month()).max()?;
    let previous_month = current_month - 1;

    let current = month_total(set, current_month, measure);
    let previous = month_total(set, previous_month, measure);
    if previous == 0.0 {
        return None;
    }

    Some(MonthOverMonth {
        current_month,
        previous_month,
        current,
        previous,
        growth_pct: (current - previous) / previous * 100.0,
    })
}

/// Revenue and order count on the most recent date in the set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestDay {
    pub date: NaiveDate,
    /// `"{Month} {Year}"`, e.g. `"August 2024"`.
    pub label: String,
    pub revenue: f64,
    pub orders: usize,
}

pub fn latest_day(set: &TransactionSet) -> Option<LatestDay> {
    let date = set.max_date()?;
    let rows = set.iter().filter(|t| t.date == date);
    let (revenue, orders) = rows.fold((0.0, 0), |(sum, n), t| {
        (sum + t.measure(Measure::SalesAmount), n + 1)
    });
    let label = format!("{} {}", month_name(date.month()).unwrap_or_default(), date.year());
    Some(LatestDay {
        date,
        label,
        revenue,
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{sample_set, tx};

    #[test]
    fn compares_latest_month_with_the_one_before() {
        let set = TransactionSet::from_rows(vec![
            tx("03/02/2023", "A", "East", "Card", "Completed", Some(100.0), 5.0),
            tx("10/03/2023", "A", "East", "Card", "Completed", Some(120.0), 6.0),
            tx("20/03/2023", "B", "West", "Cash", "Completed", Some(30.0), 4.0),
        ]);
        let mom = month_over_month(&set, Measure::SalesAmount).unwrap();
        assert_eq!(mom.current_month, 3);
        assert_eq!(mom.previous_month, 2);
        assert_eq!(mom.current, 150.0);
        assert_eq!(mom.previous, 100.0);
        assert_eq!(mom.growth_pct, 50.0);

        let marketing = month_over_month(&set, Measure::MarketingSpend).unwrap();
        assert_eq!(marketing.growth_pct, 100.0);
    }

    #[test]
    fn ignores_year_when_picking_months() {
        // November 2023 is the highest month number, even though January
        // 2024 is later in time; October has no data.
        let set = sample_set();
        assert_eq!(month_over_month(&set, Measure::SalesAmount), None);
    }

    #[test]
    fn january_has_no_previous_month() {
        let set = TransactionSet::from_rows(vec![
            tx("15/12/2022", "A", "East", "Card", "Completed", Some(100.0), 0.0),
            tx("15/01/2023", "A", "East", "Card", "Completed", Some(100.0), 0.0),
        ]);
        // December (12) is the max month; November has nothing.
        assert_eq!(month_over_month(&set, Measure::SalesAmount), None);

        let only_january = TransactionSet::from_rows(vec![tx(
            "15/01/2023", "A", "East", "Card", "Completed", Some(100.0), 0.0,
        )]);
        assert_eq!(month_over_month(&only_january, Measure::SalesAmount), None);
    }

    #[test]
    fn empty_set_has_no_growth_or_latest_day() {
        let empty = TransactionSet::default();
        assert_eq!(month_over_month(&empty, Measure::SalesAmount), None);
        assert_eq!(latest_day(&empty), None);
    }

    #[test]
    fn latest_day_sums_the_final_date() {
        let latest = latest_day(&sample_set()).unwrap();
        assert_eq!(latest.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(latest.label, "January 2024");
        assert_eq!(latest.revenue, 1950.0);
        assert_eq!(latest.orders, 2);
    }
}
