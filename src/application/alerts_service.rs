// Alerts - rule management and notification feed
use crate::application::gateway::AnalyticsGateway;
use crate::domain::analytics::{AlertNotification, AlertRule, NewAlertRule};
use std::sync::Arc;

pub struct AlertsService {
    gateway: Arc<dyn AnalyticsGateway>,
}

impl AlertsService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>) -> Self {
        Self { gateway }
    }

    pub async fn rules(&self) -> anyhow::Result<Vec<AlertRule>> {
        self.gateway.alert_rules().await
    }

    /// Validate the rule locally before submitting; an invalid rule blocks
    /// only this submission and never reaches the gateway.
    pub async fn create(&self, rule: NewAlertRule) -> anyhow::Result<AlertRule> {
        if let Err(reason) = rule.validate() {
            anyhow::bail!("invalid alert rule: {reason}");
        }
        self.gateway.create_alert_rule(&rule).await
    }

    pub async fn delete(&self, id: i64) -> anyhow::Result<()> {
        self.gateway.delete_alert_rule(id).await
    }

    pub async fn toggle(&self, id: i64) -> anyhow::Result<AlertRule> {
        self.gateway.toggle_alert_rule(id).await
    }

    pub async fn notifications(&self) -> anyhow::Result<Vec<AlertNotification>> {
        self.gateway.alert_notifications().await
    }

    /// Trigger a server-side evaluation pass over all active rules.
    pub async fn run_now(&self) -> anyhow::Result<()> {
        self.gateway.run_alerts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock_gateway::MockGateway;

    fn service() -> AlertsService {
        AlertsService::new(Arc::new(MockGateway::new()))
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_rule_before_sending() {
        let result = service()
            .create(NewAlertRule {
                name: "Margin watch".to_string(),
                metric: "MARGIN".to_string(),
                condition: "GT".to_string(),
                threshold: 0.2,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_passes_valid_rule_through() {
        let rule = service()
            .create(NewAlertRule {
                name: "Revenue floor".to_string(),
                metric: "REVENUE".to_string(),
                condition: "LT".to_string(),
                threshold: 10_000.0,
            })
            .await
            .unwrap();
        assert_eq!(rule.name, "Revenue floor");
        assert!(rule.is_active);
    }

    #[tokio::test]
    async fn test_toggle_flips_active_flag() {
        let service = service();
        let rules = service.rules().await.unwrap();
        let first = &rules[0];

        let toggled = service.toggle(first.id).await.unwrap();
        assert_eq!(toggled.id, first.id);
        assert_ne!(toggled.is_active, first.is_active);
    }
}
