// KPI and chart series domain models
use serde::Deserialize;

/// Aggregate KPI snapshot for the current filter selection. Superseded
/// wholesale on each overview fetch; individual numeric fields may be
/// patched in place by live updates.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct KpiOverview {
    pub total_revenue: f64,
    pub active_orders: i64,
    pub average_order_value: f64,
    pub active_customers: i64,
    #[serde(default)]
    pub latest_analysis: Option<String>,
}

/// One point of the revenue trend series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub revenue: f64,
}

/// One slice of a categorical breakdown (revenue by category/region).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlicePoint {
    pub name: String,
    pub value: f64,
}

/// Partial KPI delta carried by a live update. Absent fields leave the
/// corresponding snapshot value untouched.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct KpiDelta {
    #[serde(default)]
    pub total_revenue: Option<f64>,
    #[serde(default)]
    pub active_orders: Option<i64>,
    #[serde(default)]
    pub average_order_value: Option<f64>,
    #[serde(default)]
    pub active_customers: Option<i64>,
}

impl KpiDelta {
    /// Patch the set fields into a snapshot, leaving the rest alone.
    pub fn apply_to(&self, overview: &mut KpiOverview) {
        if let Some(total_revenue) = self.total_revenue {
            overview.total_revenue = total_revenue;
        }
        if let Some(active_orders) = self.active_orders {
            overview.active_orders = active_orders;
        }
        if let Some(average_order_value) = self.average_order_value {
            overview.average_order_value = average_order_value;
        }
        if let Some(active_customers) = self.active_customers {
            overview.active_customers = active_customers;
        }
    }
}

/// Tagged payload pushed over the KPI stream. Unknown tags are retained
/// as `Unknown` so new server message types never break the channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum LiveUpdate {
    #[serde(rename = "KPI_UPDATE")]
    KpiUpdate { payload: KpiDelta },
    #[serde(other)]
    Unknown,
}

/// An AI-generated insight as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AiInsight {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Natural-language explanation of a rendered chart.
#[derive(Debug, Clone, Deserialize)]
pub struct Explanation {
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_update_parse_kpi_update() {
        let raw = r#"{"type":"KPI_UPDATE","payload":{"total_revenue":58000,"active_orders":140}}"#;
        let update: LiveUpdate = serde_json::from_str(raw).unwrap();
        match update {
            LiveUpdate::KpiUpdate { payload } => {
                assert_eq!(payload.total_revenue, Some(58000.0));
                assert_eq!(payload.active_orders, Some(140));
                assert_eq!(payload.average_order_value, None);
            }
            LiveUpdate::Unknown => panic!("expected KPI_UPDATE"),
        }
    }

    #[test]
    fn test_live_update_unknown_type_is_tolerated() {
        let raw = r#"{"type":"HEARTBEAT","payload":{}}"#;
        let update: LiveUpdate = serde_json::from_str(raw).unwrap();
        assert_eq!(update, LiveUpdate::Unknown);
    }

    #[test]
    fn test_delta_patches_only_present_fields() {
        let mut overview = KpiOverview {
            total_revenue: 52450.0,
            active_orders: 126,
            average_order_value: 85.2,
            active_customers: 1240,
            latest_analysis: Some("steady".to_string()),
        };

        let delta = KpiDelta {
            total_revenue: Some(58000.0),
            active_orders: Some(140),
            ..Default::default()
        };
        delta.apply_to(&mut overview);

        assert_eq!(overview.total_revenue, 58000.0);
        assert_eq!(overview.active_orders, 140);
        assert_eq!(overview.average_order_value, 85.2);
        assert_eq!(overview.latest_analysis.as_deref(), Some("steady"));
    }
}
