// Gateway trait for the remote analytics backend
use crate::domain::analytics::{
    AffinityPair, AlertNotification, AlertRule, ChannelPerformance, ChatReply, CohortRow,
    ComparisonResult, NewAlertRule, UploadProfile,
};
use crate::domain::filters::{FilterCatalog, FilterSelection, SavedView};
use crate::domain::kpi::{AiInsight, KpiOverview, SlicePoint, TrendPoint};
use async_trait::async_trait;
use serde::Serialize;

/// Request body for the chart-explanation endpoint. `context` carries the
/// compact numeric summary the view derived from its displayed series.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainRequest {
    pub chart_name: String,
    pub context: serde_json::Value,
    pub selected_item: String,
}

/// Request body for the period-comparison endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompareRequest {
    pub current_period_label: String,
    pub previous_period_label: String,
}

/// Everything the dashboard asks of the remote backend. The backend owns
/// all aggregation and AI logic; this side only fetches and displays.
#[async_trait]
pub trait AnalyticsGateway: Send + Sync {
    // KPI endpoints
    async fn kpi_overview(&self, selection: &FilterSelection) -> anyhow::Result<KpiOverview>;
    async fn revenue_trend(&self, selection: &FilterSelection) -> anyhow::Result<Vec<TrendPoint>>;
    async fn revenue_by_category(
        &self,
        selection: &FilterSelection,
    ) -> anyhow::Result<Vec<SlicePoint>>;
    async fn revenue_by_region(
        &self,
        selection: &FilterSelection,
    ) -> anyhow::Result<Vec<SlicePoint>>;
    async fn revenue_forecast(&self, days: u32) -> anyhow::Result<Vec<TrendPoint>>;
    async fn filter_catalog(&self) -> anyhow::Result<FilterCatalog>;

    // Saved views
    async fn list_views(&self) -> anyhow::Result<Vec<SavedView>>;
    async fn create_view(&self, name: &str, settings: &str) -> anyhow::Result<SavedView>;
    async fn delete_view(&self, id: i64) -> anyhow::Result<()>;

    // AI endpoints
    async fn explain_chart(&self, request: &ExplainRequest) -> anyhow::Result<String>;
    async fn compare_periods(&self, request: &CompareRequest) -> anyhow::Result<ComparisonResult>;
    async fn latest_insights(&self) -> anyhow::Result<Vec<AiInsight>>;
    async fn chat(&self, message: &str) -> anyhow::Result<ChatReply>;

    // Analytics suite
    async fn affinity(&self) -> anyhow::Result<Vec<AffinityPair>>;
    async fn retention(&self) -> anyhow::Result<Vec<CohortRow>>;
    async fn marketing(&self) -> anyhow::Result<Vec<ChannelPerformance>>;

    // Alerts
    async fn alert_rules(&self) -> anyhow::Result<Vec<AlertRule>>;
    async fn create_alert_rule(&self, rule: &NewAlertRule) -> anyhow::Result<AlertRule>;
    async fn delete_alert_rule(&self, id: i64) -> anyhow::Result<()>;
    async fn toggle_alert_rule(&self, id: i64) -> anyhow::Result<AlertRule>;
    async fn alert_notifications(&self) -> anyhow::Result<Vec<AlertNotification>>;
    async fn run_alerts(&self) -> anyhow::Result<()>;

    // Integrations
    async fn connect_integration(&self, provider: &str) -> anyhow::Result<()>;
    async fn sync_integration(&self, provider: &str) -> anyhow::Result<String>;

    // Dataset upload
    async fn analyze_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<UploadProfile>;
    async fn clear_uploads(&self) -> anyhow::Result<()>;
}
