// HTTP gateway implementation over reqwest
use crate::application::gateway::{AnalyticsGateway, CompareRequest, ExplainRequest};
use crate::domain::analytics::{
    AffinityPair, AlertNotification, AlertRule, ChannelPerformance, ChatReply, CohortRow,
    ComparisonResult, NewAlertRule, UploadProfile,
};
use crate::domain::filters::{FilterCatalog, FilterSelection, SavedView};
use crate::domain::kpi::{AiInsight, Explanation, KpiOverview, SlicePoint, TrendPoint};
use crate::infrastructure::session_store::SessionStore;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("gateway returned HTTP {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Remote analytics gateway. Authenticated calls attach the bearer token
/// persisted in the session store. No request timeout is configured; the
/// socket is the only thing a session ever cancels.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpGateway {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        url: String,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| GatewayError::Decode { url, source })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        let request = self.client.get(&url).query(params);
        self.execute(url, request).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        let request = self.client.post(&url).json(body);
        self.execute(url, request).await
    }

    /// Send a request whose body we do not care about; only the status is
    /// checked, so empty 2xx responses are fine.
    async fn execute_ack(
        &self,
        url: String,
        request: reqwest::RequestBuilder,
    ) -> Result<(), GatewayError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), GatewayError> {
        let url = self.url(path);
        let request = self.client.post(&url).json(body);
        self.execute_ack(url, request).await
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        let url = self.url(path);
        let request = self.client.delete(&url);
        self.execute_ack(url, request).await
    }
}

#[async_trait]
impl AnalyticsGateway for HttpGateway {
    async fn kpi_overview(&self, selection: &FilterSelection) -> anyhow::Result<KpiOverview> {
        Ok(self
            .get_json("kpis/overview", &selection.query_params())
            .await?)
    }

    async fn revenue_trend(&self, selection: &FilterSelection) -> anyhow::Result<Vec<TrendPoint>> {
        Ok(self
            .get_json("kpis/revenue/trend", &selection.query_params())
            .await?)
    }

    async fn revenue_by_category(
        &self,
        selection: &FilterSelection,
    ) -> anyhow::Result<Vec<SlicePoint>> {
        Ok(self
            .get_json("kpis/revenue/category", &selection.query_params())
            .await?)
    }

    async fn revenue_by_region(
        &self,
        selection: &FilterSelection,
    ) -> anyhow::Result<Vec<SlicePoint>> {
        Ok(self
            .get_json("kpis/revenue/region", &selection.query_params())
            .await?)
    }

    async fn revenue_forecast(&self, days: u32) -> anyhow::Result<Vec<TrendPoint>> {
        Ok(self
            .get_json("kpis/revenue/forecast", &[("days", days.to_string())])
            .await?)
    }

    async fn filter_catalog(&self) -> anyhow::Result<FilterCatalog> {
        Ok(self.get_json("kpis/filters", &[]).await?)
    }

    async fn list_views(&self) -> anyhow::Result<Vec<SavedView>> {
        Ok(self.get_json("users/me/views", &[]).await?)
    }

    async fn create_view(&self, name: &str, settings: &str) -> anyhow::Result<SavedView> {
        Ok(self
            .post_json(
                "users/me/views",
                &serde_json::json!({ "name": name, "settings": settings }),
            )
            .await?)
    }

    async fn delete_view(&self, id: i64) -> anyhow::Result<()> {
        Ok(self.delete(&format!("users/me/views/{id}")).await?)
    }

    async fn explain_chart(&self, request: &ExplainRequest) -> anyhow::Result<String> {
        let explanation: Explanation = self.post_json("ai/explain", request).await?;
        Ok(explanation.explanation)
    }

    async fn compare_periods(&self, request: &CompareRequest) -> anyhow::Result<ComparisonResult> {
        Ok(self.post_json("ai/compare", request).await?)
    }

    async fn latest_insights(&self) -> anyhow::Result<Vec<AiInsight>> {
        Ok(self.get_json("ai/insights", &[]).await?)
    }

    async fn chat(&self, message: &str) -> anyhow::Result<ChatReply> {
        Ok(self
            .post_json("chat/message", &serde_json::json!({ "message": message }))
            .await?)
    }

    async fn affinity(&self) -> anyhow::Result<Vec<AffinityPair>> {
        Ok(self.get_json("analytics/affinity", &[]).await?)
    }

    async fn retention(&self) -> anyhow::Result<Vec<CohortRow>> {
        Ok(self.get_json("analytics/retention", &[]).await?)
    }

    async fn marketing(&self) -> anyhow::Result<Vec<ChannelPerformance>> {
        Ok(self.get_json("analytics/marketing", &[]).await?)
    }

    async fn alert_rules(&self) -> anyhow::Result<Vec<AlertRule>> {
        Ok(self.get_json("alerts/rules", &[]).await?)
    }

    async fn create_alert_rule(&self, rule: &NewAlertRule) -> anyhow::Result<AlertRule> {
        Ok(self.post_json("alerts/rules", rule).await?)
    }

    async fn delete_alert_rule(&self, id: i64) -> anyhow::Result<()> {
        Ok(self.delete(&format!("alerts/rules/{id}")).await?)
    }

    async fn toggle_alert_rule(&self, id: i64) -> anyhow::Result<AlertRule> {
        Ok(self
            .post_json(
                &format!("alerts/rules/{id}/toggle"),
                &serde_json::json!({}),
            )
            .await?)
    }

    async fn alert_notifications(&self) -> anyhow::Result<Vec<AlertNotification>> {
        Ok(self.get_json("alerts/notifications", &[]).await?)
    }

    async fn run_alerts(&self) -> anyhow::Result<()> {
        Ok(self.post_ack("alerts/run", &serde_json::json!({})).await?)
    }

    async fn connect_integration(&self, provider: &str) -> anyhow::Result<()> {
        Ok(self
            .post_ack(
                "integrations/connect",
                &serde_json::json!({ "provider": provider }),
            )
            .await?)
    }

    async fn sync_integration(&self, provider: &str) -> anyhow::Result<String> {
        let ack: serde_json::Value = self
            .post_json(
                &format!("integrations/sync/{provider}"),
                &serde_json::json!({}),
            )
            .await?;
        Ok(ack
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| ack.to_string()))
    }

    async fn analyze_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<UploadProfile> {
        let url = self.url("upload/analyze");
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.client.post(&url).multipart(form);
        Ok(self.execute(url, request).await?)
    }

    async fn clear_uploads(&self) -> anyhow::Result<()> {
        Ok(self.delete("upload/clear").await?)
    }
}
