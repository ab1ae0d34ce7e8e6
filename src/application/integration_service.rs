// Integrations - connect/sync providers, status persisted client-side
use crate::application::gateway::AnalyticsGateway;
use crate::infrastructure::session_store::SessionStore;
use chrono::Utc;
use std::sync::Arc;

/// Connection status as shown for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationStatus {
    pub provider: String,
    pub connected: bool,
    pub synced_at: Option<String>,
}

/// Connects and syncs data providers. The gateway does the actual work;
/// connection status only persists client-side in the session file so it
/// survives restarts.
pub struct IntegrationService {
    gateway: Arc<dyn AnalyticsGateway>,
    session: Arc<SessionStore>,
}

impl IntegrationService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>, session: Arc<SessionStore>) -> Self {
        Self { gateway, session }
    }

    pub async fn connect(&self, provider: &str) -> anyhow::Result<()> {
        self.gateway.connect_integration(provider).await?;
        self.session.set_connected(provider)?;
        Ok(())
    }

    pub async fn sync(&self, provider: &str) -> anyhow::Result<String> {
        if !self.session.is_connected(provider) {
            anyhow::bail!("provider '{provider}' is not connected");
        }
        let message = self.gateway.sync_integration(provider).await?;
        self.session.set_synced(provider, &Utc::now().to_rfc3339())?;
        Ok(message)
    }

    pub fn status(&self, provider: &str) -> IntegrationStatus {
        IntegrationStatus {
            provider: provider.to_string(),
            connected: self.session.is_connected(provider),
            synced_at: self.session.synced_at(provider),
        }
    }
}
