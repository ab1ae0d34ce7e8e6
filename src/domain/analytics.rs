// Analytics suite domain models - affinity, retention, marketing, alerts
use serde::{Deserialize, Serialize};

/// Market-basket affinity between two products. Lift and confidence are
/// computed remotely; this side only displays them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AffinityPair {
    pub product_a: String,
    pub product_b: String,
    pub frequency: i64,
    pub confidence: f64,
    pub lift: f64,
    #[serde(default)]
    pub strength: Option<String>,
}

/// Repeat-purchase rate of one cohort over subsequent periods.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CohortRow {
    pub cohort: String,
    #[serde(default)]
    pub customers: i64,
    #[serde(default)]
    pub retention: Vec<RetentionCell>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetentionCell {
    pub period: i32,
    pub rate: f64,
}

/// Channel-level marketing performance, sorted by ROAS on the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelPerformance {
    pub channel_id: i64,
    pub channel_name: String,
    pub spend: f64,
    pub revenue: f64,
    pub roas: f64,
    pub conversions: i64,
    #[serde(default)]
    pub cac: f64,
    #[serde(default)]
    pub cpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: i64,
    pub name: String,
    pub metric: String,
    pub condition: String,
    pub threshold: f64,
    pub is_active: bool,
    #[serde(default)]
    pub last_triggered_at: Option<String>,
}

/// Fields required to create a rule. Validation happens before the
/// request is sent; a failed validation blocks only this submission.
#[derive(Debug, Clone, Serialize)]
pub struct NewAlertRule {
    pub name: String,
    pub metric: String,
    pub condition: String,
    pub threshold: f64,
}

impl NewAlertRule {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("rule name is required".to_string());
        }
        if !matches!(self.metric.as_str(), "REVENUE" | "ORDERS" | "AOV") {
            return Err(format!("unknown metric: {}", self.metric));
        }
        if !matches!(self.condition.as_str(), "GT" | "LT") {
            return Err(format!("unknown condition: {}", self.condition));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlertNotification {
    pub id: i64,
    pub message: String,
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// KPI aggregates for one side of a period comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeriodKpis {
    pub total_revenue: f64,
    pub active_orders: i64,
    pub aov: f64,
}

/// Pre-formatted change labels computed by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeriodDelta {
    pub revenue_change: String,
    pub orders_change: String,
    pub aov_change: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonResult {
    pub current: PeriodKpis,
    pub previous: PeriodKpis,
    pub delta: PeriodDelta,
    #[serde(default)]
    pub ai_explanation: serde_json::Value,
}

/// One bot turn from the chat endpoint. `sql` is surfaced by the backend
/// for transparency only.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub sql: Option<String>,
}

/// Server-side profile of an uploaded dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadProfile {
    #[serde(default)]
    pub shape: Option<(i64, i64)>,
    #[serde(default)]
    pub missing_values: i64,
    #[serde(default)]
    pub duplicates: i64,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub preview: Vec<serde_json::Value>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rule_validation() {
        let rule = NewAlertRule {
            name: "Revenue floor".to_string(),
            metric: "REVENUE".to_string(),
            condition: "LT".to_string(),
            threshold: 10_000.0,
        };
        assert!(rule.validate().is_ok());

        let blank = NewAlertRule {
            name: "  ".to_string(),
            ..rule.clone()
        };
        assert!(blank.validate().is_err());

        let bad_metric = NewAlertRule {
            metric: "MARGIN".to_string(),
            ..rule
        };
        assert!(bad_metric.validate().is_err());
    }
}
