// Analytics suite - affinity, retention, marketing (display only)
use crate::application::gateway::AnalyticsGateway;
use crate::domain::analytics::{AffinityPair, ChannelPerformance, CohortRow};
use std::sync::Arc;

/// Fetches the remotely computed analytics tables. All the heavy lifting
/// (lift, cohort rates, ROAS) happens on the backend.
pub struct AnalyticsService {
    gateway: Arc<dyn AnalyticsGateway>,
}

impl AnalyticsService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>) -> Self {
        Self { gateway }
    }

    pub async fn affinity(&self) -> anyhow::Result<Vec<AffinityPair>> {
        self.gateway.affinity().await
    }

    pub async fn retention(&self) -> anyhow::Result<Vec<CohortRow>> {
        self.gateway.retention().await
    }

    pub async fn marketing(&self) -> anyhow::Result<Vec<ChannelPerformance>> {
        self.gateway.marketing().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock_gateway::MockGateway;

    #[tokio::test]
    async fn test_tables_come_back_sorted_by_strength() {
        let service = AnalyticsService::new(Arc::new(MockGateway::new()));

        let affinity = service.affinity().await.unwrap();
        assert!(!affinity.is_empty());
        assert!(affinity.windows(2).all(|w| w[0].lift >= w[1].lift));

        let marketing = service.marketing().await.unwrap();
        assert!(marketing.windows(2).all(|w| w[0].roas >= w[1].roas));
    }

    #[tokio::test]
    async fn test_retention_rows_carry_period_cells() {
        let service = AnalyticsService::new(Arc::new(MockGateway::new()));
        let rows = service.retention().await.unwrap();
        assert!(rows.iter().all(|r| !r.retention.is_empty()));
    }
}
