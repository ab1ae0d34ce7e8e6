// Saved views - persist and restore filter snapshots via the gateway
use crate::application::filter_store::FilterStore;
use crate::application::gateway::AnalyticsGateway;
use crate::domain::filters::{SavedView, ViewSettings};
use anyhow::Context;
use std::sync::Arc;

pub struct SavedViewsService {
    gateway: Arc<dyn AnalyticsGateway>,
    filters: Arc<FilterStore>,
}

impl SavedViewsService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>, filters: Arc<FilterStore>) -> Self {
        Self { gateway, filters }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<SavedView>> {
        self.gateway.list_views().await
    }

    /// Snapshot the current selection under a name. An empty name blocks
    /// only this submission.
    pub async fn save(&self, name: &str) -> anyhow::Result<SavedView> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("view name is required");
        }
        let settings = ViewSettings::snapshot(&self.filters.selection()).encode();
        self.gateway.create_view(name, &settings).await
    }

    /// Restore a saved snapshot into the filter store, reproducing the
    /// exact axis values that were active at save time.
    pub fn load(&self, view: &SavedView) -> anyhow::Result<()> {
        let settings = ViewSettings::decode(&view.settings)
            .with_context(|| format!("failed to parse settings of view '{}'", view.name))?;
        self.filters.apply_view(&settings);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> anyhow::Result<()> {
        self.gateway.delete_view(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::DateRange;
    use crate::infrastructure::mock_gateway::MockGateway;

    fn service() -> (SavedViewsService, Arc<FilterStore>) {
        let filters = Arc::new(FilterStore::new());
        let service = SavedViewsService::new(Arc::new(MockGateway::new()), filters.clone());
        (service, filters)
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips_selection() {
        let (service, filters) = service();
        filters.set_region(Some("Asia".to_string()));
        filters.set_date_range(DateRange::Last7Days);

        let view = service.save("Asia weekly").await.unwrap();

        // Drift the live selection, then restore.
        filters.reset();
        filters.set_category(Some("Fashion".to_string()));
        service.load(&view).unwrap();

        let selection = filters.selection();
        assert_eq!(selection.category, None);
        assert_eq!(selection.region.as_deref(), Some("Asia"));
        assert_eq!(selection.date_range, DateRange::Last7Days);
    }

    #[tokio::test]
    async fn test_blank_name_blocks_submission() {
        let (service, _filters) = service();
        assert!(service.save("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_settings() {
        let (service, _filters) = service();
        let view = SavedView {
            id: 9,
            name: "broken".to_string(),
            settings: "{not json".to_string(),
        };
        assert!(service.load(&view).is_err());
    }
}
