use std::fmt;

use log::info;
use serde::Serialize;

use crate::data::model::{Dimension, Measure, OrderStatus, Transaction, TransactionSet};
use crate::metrics::hierarchy::DECOMPOSITION_LEVELS;
use crate::metrics::pivot::{
    PivotTable, ProductPerformance, StatusCount, product_month_heatmap, product_performance,
    status_distribution,
};
use crate::metrics::rates::group_totals;
use crate::metrics::{
    Aggregate, GroupedValues, HierarchyNode, KeyMetrics, LatestDay, Level, MonthOverMonth,
    RateRow, SmoothingWindow, TrendPoint, build_hierarchy, grouped_sum, key_metrics, latest_day,
    month_over_month, smoothed_trends, status_rate_by, status_rate_with_totals,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub window: SmoothingWindow,
}

// ---------------------------------------------------------------------------
// Report sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RevenueBreakdown {
    /// Descending by revenue.
    pub by_product: GroupedValues,
    pub by_payment_method: GroupedValues,
    /// Descending by revenue.
    pub by_region: GroupedValues,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationRates {
    pub by_payment_method: Vec<RateRow>,
    pub by_region: Vec<RateRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnRates {
    pub by_product: Vec<RateRow>,
    pub by_region: Vec<RateRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hierarchies {
    /// Total → year → quarter → month → product → region → payment method.
    pub marketing_spend: HierarchyNode,
    /// Same levels as `marketing_spend`, over sales.
    pub sales: HierarchyNode,
    /// Total → year → quarter → month.
    pub revenue_by_period: HierarchyNode,
    /// Order counts: year → month → status.
    pub order_status: HierarchyNode,
}

/// Every aggregate the dashboard shows, computed from one filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub key_metrics: KeyMetrics,
    pub revenue: RevenueBreakdown,
    pub cancellations: CancellationRates,
    pub returns: ReturnRates,
    pub hierarchies: Hierarchies,
    pub status_distribution: Vec<StatusCount>,
    pub product_performance: Vec<ProductPerformance>,
    pub heatmap: PivotTable,
    pub smoothing_window: usize,
    pub trends: Vec<TrendPoint>,
    pub month_over_month: Option<MonthOverMonth>,
    pub latest_day: Option<LatestDay>,
    pub cancelled_orders: Vec<Transaction>,
    pub returned_orders: Vec<Transaction>,
}

/// Compute the full report. Nothing is cached; call again after every
/// filter change.
pub fn build_report(set: &TransactionSet, options: &ReportOptions) -> DashboardReport {
    info!(
        "building report over {} rows (window {})",
        set.len(),
        options.window.get()
    );

    let revenue = RevenueBreakdown {
        by_product: grouped_sum(set, &[Dimension::Product], Measure::SalesAmount).ranked(),
        by_payment_method: grouped_sum(set, &[Dimension::PaymentMethod], Measure::SalesAmount),
        by_region: grouped_sum(set, &[Dimension::Region], Measure::SalesAmount).ranked(),
    };

    // Computed once and shared by both region rate tables.
    let region_totals = group_totals(set, Dimension::Region);

    let cancellations = CancellationRates {
        by_payment_method: status_rate_by(set, &OrderStatus::Cancelled, Dimension::PaymentMethod),
        by_region: status_rate_with_totals(
            set,
            &OrderStatus::Cancelled,
            Dimension::Region,
            &region_totals,
        ),
    };

    let returns = ReturnRates {
        by_product: status_rate_by(set, &OrderStatus::Returned, Dimension::Product),
        by_region: status_rate_with_totals(
            set,
            &OrderStatus::Returned,
            Dimension::Region,
            &region_totals,
        ),
    };

    let hierarchies = Hierarchies {
        marketing_spend: build_hierarchy(
            set,
            "Total Marketing Spend",
            &DECOMPOSITION_LEVELS,
            Aggregate::Sum(Measure::MarketingSpend),
        ),
        sales: build_hierarchy(
            set,
            "Total Sales",
            &DECOMPOSITION_LEVELS,
            Aggregate::Sum(Measure::SalesAmount),
        ),
        revenue_by_period: build_hierarchy(
            set,
            "Total",
            &[Level::Year, Level::Quarter, Level::Month],
            Aggregate::Sum(Measure::SalesAmount),
        ),
        order_status: build_hierarchy(
            set,
            "Orders",
            &[Level::Year, Level::Month, Level::Dimension(Dimension::OrderStatus)],
            Aggregate::Count,
        ),
    };

    DashboardReport {
        key_metrics: key_metrics(set),
        revenue,
        cancellations,
        returns,
        hierarchies,
        status_distribution: status_distribution(set),
        product_performance: product_performance(set),
        heatmap: product_month_heatmap(set),
        smoothing_window: options.window.get(),
        trends: smoothed_trends(set, options.window),
        month_over_month: month_over_month(set, Measure::SalesAmount),
        latest_day: latest_day(set),
        cancelled_orders: set.with_status(&OrderStatus::Cancelled).rows,
        returned_orders: set.with_status(&OrderStatus::Returned).rows,
    }
}

// ---------------------------------------------------------------------------
// Plain-text rendering
// ---------------------------------------------------------------------------

/// `1234567.891` → `"1,234,567.89"`.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn format_currency(value: f64) -> String {
    format!("${}", format_thousands(value, 2))
}

fn write_grouped(f: &mut fmt::Formatter<'_>, title: &str, values: &GroupedValues) -> fmt::Result {
    writeln!(f, "{title}")?;
    for row in &values.rows {
        writeln!(f, "  {:<24} {:>16}", row.key.join(" / "), format_currency(row.value))?;
    }
    Ok(())
}

fn write_rates(f: &mut fmt::Formatter<'_>, title: &str, rows: &[RateRow]) -> fmt::Result {
    writeln!(f, "{title}")?;
    for row in rows {
        writeln!(
            f,
            "  {:<24} {:>7.2}%  ({}/{})",
            row.group, row.rate, row.matched, row.total
        )?;
    }
    Ok(())
}

fn write_orders(f: &mut fmt::Formatter<'_>, title: &str, rows: &[Transaction]) -> fmt::Result {
    writeln!(f, "{title} ({})", rows.len())?;
    for t in rows {
        let sales = t.sales_amount.map(format_currency).unwrap_or_else(|| "-".to_string());
        writeln!(
            f,
            "  {}  {:<12} {:<10} {:<14} {:>12}",
            t.date.format("%d/%m/%Y"),
            t.product,
            t.region,
            t.payment_method,
            sales
        )?;
    }
    Ok(())
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.key_metrics;
        writeln!(f, "Key Metrics")?;
        writeln!(f, "  Total Revenue       {}", format_currency(m.total_revenue))?;
        writeln!(f, "  Total Orders        {}", m.total_orders)?;
        writeln!(f, "  Cancellation Rate   {:.2}%", m.cancellation_rate)?;
        writeln!(f, "  Return Rate         {:.2}%", m.return_rate)?;
        writeln!(f)?;

        write_grouped(f, "Region Breakdown", &m.region_revenue)?;
        writeln!(f)?;
        write_grouped(f, "Revenue by Product", &self.revenue.by_product)?;
        write_grouped(f, "Revenue by Payment Method", &self.revenue.by_payment_method)?;
        write_grouped(f, "Revenue by Region", &self.revenue.by_region)?;
        writeln!(f)?;

        write_rates(
            f,
            "Cancellation Rate by Payment Method",
            &self.cancellations.by_payment_method,
        )?;
        write_rates(f, "Cancellation Rate by Region", &self.cancellations.by_region)?;
        write_rates(f, "Return Rate by Product", &self.returns.by_product)?;
        write_rates(f, "Return Rate by Region", &self.returns.by_region)?;
        writeln!(f)?;

        write_orders(f, "Cancelled Orders", &self.cancelled_orders)?;
        write_orders(f, "Returned Orders", &self.returned_orders)?;
        writeln!(f)?;

        writeln!(f, "Time-Based Metrics")?;
        match &self.latest_day {
            Some(day) => {
                writeln!(f, "  {} ({})", day.label, day.date.format("%d/%m/%Y"))?;
                writeln!(f, "    Revenue           {}", format_currency(day.revenue))?;
                writeln!(f, "    Orders            {}", day.orders)?;
            }
            None => writeln!(f, "  no orders")?,
        }
        if let Some(mom) = &self.month_over_month {
            writeln!(
                f,
                "  Month-over-Month Growth  {}%",
                format_thousands(mom.growth_pct, 1)
            )?;
        }

        if let Some(last) = self.trends.last() {
            writeln!(f)?;
            writeln!(
                f,
                "Smoothed trend ({}-point window), last point {}",
                self.smoothing_window,
                last.date.format("%d/%m/%Y")
            )?;
            writeln!(f, "  Sales               {}", format_currency(last.sales_amount_smooth))?;
            writeln!(f, "  Marketing Spend     {}", format_currency(last.marketing_spend_smooth))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::sample_set;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0.0, 2), "0.00");
        assert_eq!(format_thousands(999.5, 2), "999.50");
        assert_eq!(format_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_thousands(-12345.0, 1), "-12,345.0");
        assert_eq!(format_thousands(-0.001, 2), "0.00");
        assert_eq!(format_currency(7100.0), "$7,100.00");
    }

    #[test]
    fn report_sections_are_consistent() {
        let set = sample_set();
        let report = build_report(&set, &ReportOptions::default());

        assert_eq!(report.key_metrics.total_orders, 9);
        assert_eq!(report.revenue.by_product.rows[0].key, vec!["Laptop".to_string()]);
        assert_eq!(report.revenue.by_region.total(), report.key_metrics.total_revenue);
        assert_eq!(report.hierarchies.sales.value, report.key_metrics.total_revenue);
        assert_eq!(report.hierarchies.order_status.value, 9.0);
        assert_eq!(report.cancellations.by_region.len(), report.returns.by_region.len());
        assert_eq!(report.smoothing_window, 15);
        assert_eq!(report.trends.len(), 7);
    }

    #[test]
    fn empty_set_report_has_zeros_and_renders() {
        let report = build_report(&TransactionSet::default(), &ReportOptions::default());
        assert_eq!(report.key_metrics.total_revenue, 0.0);
        assert_eq!(report.key_metrics.cancellation_rate, 0.0);
        assert!(report.trends.is_empty());
        assert!(report.month_over_month.is_none());

        let text = report.to_string();
        assert!(text.contains("Total Revenue       $0.00"));
        assert!(text.contains("no orders"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["key_metrics"]["total_orders"], 0);
        assert!(json["latest_day"].is_null());
    }

    #[test]
    fn json_output_uses_snake_case_and_iso_dates() {
        let report = build_report(&sample_set(), &ReportOptions::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["revenue"]["by_region"]["keys"][0], "region");
        assert_eq!(json["latest_day"]["date"], "2024-01-02");
        assert_eq!(json["trends"][0]["sales_amount"], 1800.0);
        assert_eq!(json["cancelled_orders"][0]["order_status"], "Cancelled");
    }

    #[test]
    fn cancelled_and_returned_tables_hold_only_matching_rows() {
        let report = build_report(&sample_set(), &ReportOptions::default());

        assert_eq!(report.cancelled_orders.len(), 2);
        assert!(report
            .cancelled_orders
            .iter()
            .all(|t| t.order_status == OrderStatus::Cancelled));
        assert_eq!(report.returned_orders.len(), 2);
        assert!(report
            .returned_orders
            .iter()
            .all(|t| t.order_status == OrderStatus::Returned));

        // Source order is kept.
        assert_eq!(report.returned_orders[0].product, "Laptop");
        assert_eq!(report.returned_orders[1].product, "Phone");

        let text = report.to_string();
        assert!(text.contains("Cancelled Orders (2)"));
        assert!(text.contains("Returned Orders (2)"));

        let empty = build_report(&TransactionSet::default(), &ReportOptions::default());
        assert!(empty.cancelled_orders.is_empty());
        assert!(empty.returned_orders.is_empty());
    }
}
