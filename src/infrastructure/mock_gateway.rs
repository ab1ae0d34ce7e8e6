// Offline fixture gateway - demo data source, also used by unit tests
use crate::application::gateway::{AnalyticsGateway, CompareRequest, ExplainRequest};
use crate::domain::analytics::{
    AffinityPair, AlertNotification, AlertRule, ChannelPerformance, ChatReply, CohortRow,
    ComparisonResult, NewAlertRule, PeriodDelta, PeriodKpis, RetentionCell, UploadProfile,
};
use crate::domain::filters::{FilterCatalog, FilterLabels, FilterSelection, SavedView};
use crate::domain::kpi::{AiInsight, KpiOverview, SlicePoint, TrendPoint};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory stand-in for the remote gateway. Serves plausible fixture
/// data so the dashboard can run without a backend, and doubles as the
/// test double for every view service.
pub struct MockGateway {
    failing: bool,
    next_id: AtomicI64,
    views: Mutex<Vec<SavedView>>,
    rules: Mutex<Vec<AlertRule>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            failing: false,
            next_id: AtomicI64::new(100),
            views: Mutex::new(Vec::new()),
            rules: Mutex::new(vec![
                AlertRule {
                    id: 1,
                    name: "Revenue floor".to_string(),
                    metric: "REVENUE".to_string(),
                    condition: "LT".to_string(),
                    threshold: 10_000.0,
                    is_active: true,
                    last_triggered_at: None,
                },
                AlertRule {
                    id: 2,
                    name: "Order surge".to_string(),
                    metric: "ORDERS".to_string(),
                    condition: "GT".to_string(),
                    threshold: 500.0,
                    is_active: false,
                    last_triggered_at: Some("2026-08-01T12:00:00Z".to_string()),
                },
            ]),
        }
    }

    /// Every call returns an error; exercises the degrade paths.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    fn guard(&self) -> anyhow::Result<()> {
        if self.failing {
            anyhow::bail!("mock gateway configured to fail");
        }
        Ok(())
    }

    fn alloc_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn lock_views(&self) -> std::sync::MutexGuard<'_, Vec<SavedView>> {
        self.views.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_rules(&self) -> std::sync::MutexGuard<'_, Vec<AlertRule>> {
        self.rules.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsGateway for MockGateway {
    async fn kpi_overview(&self, selection: &FilterSelection) -> anyhow::Result<KpiOverview> {
        self.guard()?;
        // A slice narrows the aggregates so filtered fetches are visibly
        // different from global ones.
        let scale = if selection.is_sliced() { 0.4 } else { 1.0 };
        Ok(KpiOverview {
            total_revenue: 52_450.0 * scale,
            active_orders: (126.0 * scale) as i64,
            average_order_value: 85.2,
            active_customers: (1_240.0 * scale) as i64,
            latest_analysis: Some(
                "Revenue is trending upward, driven by the Electronics category.".to_string(),
            ),
        })
    }

    async fn revenue_trend(&self, _selection: &FilterSelection) -> anyhow::Result<Vec<TrendPoint>> {
        self.guard()?;
        Ok((1..=14)
            .map(|day| TrendPoint {
                date: format!("2026-07-{day:02}"),
                revenue: 1_500.0 + (day as f64) * 120.0 + if day % 3 == 0 { 400.0 } else { 0.0 },
            })
            .collect())
    }

    async fn revenue_by_category(
        &self,
        _selection: &FilterSelection,
    ) -> anyhow::Result<Vec<SlicePoint>> {
        self.guard()?;
        Ok([
            ("Home", 9_800.0),
            ("Sports", 4_800.0),
            ("Beauty", 3_908.0),
            ("Electronics", 2_400.0),
            ("Fashion", 1_398.0),
            ("Toys", 1_120.0),
            ("Garden", 980.0),
            ("Books", 640.0),
            ("Grocery", 410.0),
        ]
        .into_iter()
        .map(|(name, value)| SlicePoint {
            name: name.to_string(),
            value,
        })
        .collect())
    }

    async fn revenue_by_region(
        &self,
        _selection: &FilterSelection,
    ) -> anyhow::Result<Vec<SlicePoint>> {
        self.guard()?;
        Ok([
            ("North America", 21_300.0),
            ("Europe", 17_850.0),
            ("Asia", 13_300.0),
        ]
        .into_iter()
        .map(|(name, value)| SlicePoint {
            name: name.to_string(),
            value,
        })
        .collect())
    }

    async fn revenue_forecast(&self, days: u32) -> anyhow::Result<Vec<TrendPoint>> {
        self.guard()?;
        Ok((1..=days.min(30))
            .map(|day| TrendPoint {
                date: format!("2026-08-{day:02}"),
                revenue: 3_200.0 + (day as f64) * 95.0,
            })
            .collect())
    }

    async fn filter_catalog(&self) -> anyhow::Result<FilterCatalog> {
        self.guard()?;
        Ok(FilterCatalog {
            categories: ["Electronics", "Fashion", "Home", "Beauty", "Sports"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            regions: ["North America", "Europe", "Asia"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            labels: Some(FilterLabels {
                category: "Product Line".to_string(),
                region: "Market".to_string(),
            }),
        })
    }

    async fn list_views(&self) -> anyhow::Result<Vec<SavedView>> {
        self.guard()?;
        Ok(self.lock_views().clone())
    }

    async fn create_view(&self, name: &str, settings: &str) -> anyhow::Result<SavedView> {
        self.guard()?;
        let view = SavedView {
            id: self.alloc_id(),
            name: name.to_string(),
            settings: settings.to_string(),
        };
        self.lock_views().push(view.clone());
        Ok(view)
    }

    async fn delete_view(&self, id: i64) -> anyhow::Result<()> {
        self.guard()?;
        self.lock_views().retain(|v| v.id != id);
        Ok(())
    }

    async fn explain_chart(&self, request: &ExplainRequest) -> anyhow::Result<String> {
        self.guard()?;
        Ok(format!(
            "{} shows steady growth across the selected window ({}).",
            request.chart_name, request.selected_item
        ))
    }

    async fn compare_periods(&self, request: &CompareRequest) -> anyhow::Result<ComparisonResult> {
        self.guard()?;
        Ok(ComparisonResult {
            current: PeriodKpis {
                total_revenue: 52_000.0,
                active_orders: 610,
                aov: 85.2,
            },
            previous: PeriodKpis {
                total_revenue: 45_000.0,
                active_orders: 570,
                aov: 78.9,
            },
            delta: PeriodDelta {
                revenue_change: "+15.5%".to_string(),
                orders_change: "+7.0%".to_string(),
                aov_change: "+8.0%".to_string(),
            },
            ai_explanation: serde_json::json!({
                "title": format!(
                    "{} outperformed {}",
                    request.current_period_label, request.previous_period_label
                ),
                "content": "Higher order volume at a better average basket drove the gain.",
            }),
        })
    }

    async fn latest_insights(&self) -> anyhow::Result<Vec<AiInsight>> {
        self.guard()?;
        Ok(vec![
            AiInsight {
                id: 2,
                title: "Revenue Spike Detected".to_string(),
                kind: "ANOMALY".to_string(),
                content: "Unusual spike in Electronics driven by wireless headphone sales."
                    .to_string(),
                confidence_score: Some(0.87),
                created_at: Some("2026-08-05T08:30:00Z".to_string()),
            },
            AiInsight {
                id: 1,
                title: "Inventory Warning".to_string(),
                kind: "PREDICTION".to_string(),
                content: "Low stock predicted for Smart Watch Series 5 within 48 hours."
                    .to_string(),
                confidence_score: Some(0.74),
                created_at: Some("2026-08-04T16:10:00Z".to_string()),
            },
        ])
    }

    async fn chat(&self, message: &str) -> anyhow::Result<ChatReply> {
        self.guard()?;
        Ok(ChatReply {
            role: "bot".to_string(),
            content: format!("Based on current data, here is what I found about \"{message}\"."),
            sql: None,
        })
    }

    async fn affinity(&self) -> anyhow::Result<Vec<AffinityPair>> {
        self.guard()?;
        Ok(vec![
            AffinityPair {
                product_a: "Wireless Headphones".to_string(),
                product_b: "Phone Case".to_string(),
                frequency: 42,
                confidence: 61.0,
                lift: 2.4,
                strength: Some("High".to_string()),
            },
            AffinityPair {
                product_a: "Running Shoes".to_string(),
                product_b: "Sports Socks".to_string(),
                frequency: 31,
                confidence: 48.5,
                lift: 1.6,
                strength: Some("Medium".to_string()),
            },
        ])
    }

    async fn retention(&self) -> anyhow::Result<Vec<CohortRow>> {
        self.guard()?;
        Ok(["2026-05", "2026-06", "2026-07"]
            .iter()
            .enumerate()
            .map(|(i, cohort)| CohortRow {
                cohort: cohort.to_string(),
                customers: 320 - (i as i64) * 40,
                retention: (0..3 - i as i32)
                    .map(|period| RetentionCell {
                        period,
                        rate: 100.0 / (period as f64 + 1.5),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn marketing(&self) -> anyhow::Result<Vec<ChannelPerformance>> {
        self.guard()?;
        Ok(vec![
            ChannelPerformance {
                channel_id: 1,
                channel_name: "Email".to_string(),
                spend: 1_200.0,
                revenue: 9_600.0,
                roas: 8.0,
                conversions: 210,
                cac: 8.6,
                cpa: 5.7,
            },
            ChannelPerformance {
                channel_id: 2,
                channel_name: "Paid Search".to_string(),
                spend: 5_400.0,
                revenue: 18_900.0,
                roas: 3.5,
                conversions: 340,
                cac: 21.3,
                cpa: 15.9,
            },
            ChannelPerformance {
                channel_id: 3,
                channel_name: "Social".to_string(),
                spend: 3_100.0,
                revenue: 6_200.0,
                roas: 2.0,
                conversions: 150,
                cac: 28.2,
                cpa: 20.7,
            },
        ])
    }

    async fn alert_rules(&self) -> anyhow::Result<Vec<AlertRule>> {
        self.guard()?;
        Ok(self.lock_rules().clone())
    }

    async fn create_alert_rule(&self, rule: &NewAlertRule) -> anyhow::Result<AlertRule> {
        self.guard()?;
        let created = AlertRule {
            id: self.alloc_id(),
            name: rule.name.clone(),
            metric: rule.metric.clone(),
            condition: rule.condition.clone(),
            threshold: rule.threshold,
            is_active: true,
            last_triggered_at: None,
        };
        self.lock_rules().push(created.clone());
        Ok(created)
    }

    async fn delete_alert_rule(&self, id: i64) -> anyhow::Result<()> {
        self.guard()?;
        self.lock_rules().retain(|r| r.id != id);
        Ok(())
    }

    async fn toggle_alert_rule(&self, id: i64) -> anyhow::Result<AlertRule> {
        self.guard()?;
        let mut rules = self.lock_rules();
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow::anyhow!("no alert rule with id {id}"))?;
        rule.is_active = !rule.is_active;
        Ok(rule.clone())
    }

    async fn alert_notifications(&self) -> anyhow::Result<Vec<AlertNotification>> {
        self.guard()?;
        Ok(vec![AlertNotification {
            id: 11,
            message: "Rule 'Revenue floor' triggered: revenue fell below $10,000".to_string(),
            is_read: false,
            created_at: Some("2026-08-05T22:15:00Z".to_string()),
        }])
    }

    async fn run_alerts(&self) -> anyhow::Result<()> {
        self.guard()
    }

    async fn connect_integration(&self, _provider: &str) -> anyhow::Result<()> {
        self.guard()
    }

    async fn sync_integration(&self, provider: &str) -> anyhow::Result<String> {
        self.guard()?;
        Ok(format!("Synced 1,204 records from {provider}"))
    }

    async fn analyze_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<UploadProfile> {
        self.guard()?;
        let rows = bytes.iter().filter(|b| **b == b'\n').count() as i64;
        Ok(UploadProfile {
            shape: Some((rows.max(1), 5)),
            missing_values: 3,
            duplicates: 1,
            columns: ["order_id", "date", "category", "region", "amount"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview: Vec::new(),
            recommendations: vec![format!(
                "Drop the duplicate rows found in {file_name} before importing."
            )],
        })
    }

    async fn clear_uploads(&self) -> anyhow::Result<()> {
        self.guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sliced_overview_differs_from_global() {
        let gateway = MockGateway::new();
        let global = gateway
            .kpi_overview(&FilterSelection::default())
            .await
            .unwrap();
        let sliced = gateway
            .kpi_overview(&FilterSelection {
                region: Some("Asia".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(sliced.total_revenue < global.total_revenue);
    }

    #[tokio::test]
    async fn test_view_crud_round_trip() {
        let gateway = MockGateway::new();
        let view = gateway.create_view("test", "{}").await.unwrap();
        assert_eq!(gateway.list_views().await.unwrap().len(), 1);
        gateway.delete_view(view.id).await.unwrap();
        assert!(gateway.list_views().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_mode_errors_everywhere() {
        let gateway = MockGateway::failing();
        assert!(
            gateway
                .kpi_overview(&FilterSelection::default())
                .await
                .is_err()
        );
        assert!(gateway.latest_insights().await.is_err());
        assert!(gateway.run_alerts().await.is_err());
    }
}
