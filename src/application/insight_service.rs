// AI insights - feed, period comparison, and one-shot chat questions
use crate::application::gateway::{AnalyticsGateway, CompareRequest};
use crate::domain::analytics::{ChatReply, ComparisonResult};
use crate::domain::kpi::AiInsight;
use std::sync::Arc;

pub struct InsightService {
    gateway: Arc<dyn AnalyticsGateway>,
}

impl InsightService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>) -> Self {
        Self { gateway }
    }

    /// Most recent AI-generated insights, newest first.
    pub async fn feed(&self) -> anyhow::Result<Vec<AiInsight>> {
        self.gateway.latest_insights().await
    }

    /// The single latest insight, used for the report's analysis block.
    pub async fn latest(&self) -> anyhow::Result<Option<AiInsight>> {
        Ok(self.feed().await?.into_iter().next())
    }

    pub async fn compare(
        &self,
        current_label: &str,
        previous_label: &str,
    ) -> anyhow::Result<ComparisonResult> {
        self.gateway
            .compare_periods(&CompareRequest {
                current_period_label: current_label.to_string(),
                previous_period_label: previous_label.to_string(),
            })
            .await
    }

    pub async fn ask(&self, question: &str) -> anyhow::Result<ChatReply> {
        let question = question.trim();
        if question.is_empty() {
            anyhow::bail!("question is required");
        }
        self.gateway.chat(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock_gateway::MockGateway;

    #[tokio::test]
    async fn test_latest_takes_first_of_feed() {
        let service = InsightService::new(Arc::new(MockGateway::new()));
        let feed = service.feed().await.unwrap();
        let latest = service.latest().await.unwrap().unwrap();
        assert_eq!(latest.id, feed[0].id);
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let service = InsightService::new(Arc::new(MockGateway::new()));
        assert!(service.ask("  ").await.is_err());
    }
}
