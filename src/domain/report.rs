// Report domain model - structured report contents and captured regions
use crate::domain::kpi::KpiOverview;

/// A selectable dashboard region in the report catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// KPI card values as they appear in the generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCards {
    pub revenue: String,
    pub orders: String,
    pub average_order_value: String,
    pub customers: String,
}

impl KpiCards {
    pub fn from_overview(overview: &KpiOverview) -> Self {
        Self {
            revenue: format_currency(overview.total_revenue),
            orders: format_count(overview.active_orders),
            average_order_value: format_currency(overview.average_order_value),
            customers: format_count(overview.active_customers),
        }
    }
}

/// The insight block on the report's first page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInsight {
    pub title: String,
    pub content: String,
}

/// Everything the structured report lays out. Built from a fresh overview
/// fetch at generation time, never from whatever the screen last showed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub title: String,
    pub generated_on: String,
    pub kpis: KpiCards,
    pub insight: Option<ReportInsight>,
}

/// A rasterized dashboard region ready for embedding. `rgb` holds
/// width * height * 3 bytes, row major.
#[derive(Debug, Clone)]
pub struct RenderedRegion {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Dollar amount with thousands separators, two decimals only when the
/// value has cents.
pub fn format_currency(value: f64) -> String {
    let whole = value.trunc() as i64;
    let cents = ((value - value.trunc()) * 100.0).round() as i64;
    if cents == 0 {
        format!("${}", group_thousands(whole))
    } else {
        format!("${}.{:02}", group_thousands(whole), cents.abs())
    }
}

pub fn format_count(value: i64) -> String {
    group_thousands(value)
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(52450.0), "$52,450");
        assert_eq!(format_currency(85.2), "$85.20");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1240), "1,240");
        assert_eq!(format_count(126), "126");
    }

    #[test]
    fn test_cards_from_overview() {
        let overview = KpiOverview {
            total_revenue: 52450.0,
            active_orders: 126,
            average_order_value: 85.2,
            active_customers: 1240,
            latest_analysis: None,
        };
        let cards = KpiCards::from_overview(&overview);
        assert_eq!(cards.revenue, "$52,450");
        assert_eq!(cards.orders, "126");
        assert_eq!(cards.average_order_value, "$85.20");
        assert_eq!(cards.customers, "1,240");
    }
}
