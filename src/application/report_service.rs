// Report assembly - fresh data for the structured executive report
use crate::application::filter_store::FilterStore;
use crate::application::gateway::AnalyticsGateway;
use crate::application::insight_service::InsightService;
use crate::domain::report::{KpiCards, ReportData, ReportInsight, ReportSection};
use chrono::Local;
use std::sync::Arc;

pub struct ReportService {
    gateway: Arc<dyn AnalyticsGateway>,
    filters: Arc<FilterStore>,
    sections: Vec<ReportSection>,
}

impl ReportService {
    pub fn new(
        gateway: Arc<dyn AnalyticsGateway>,
        filters: Arc<FilterStore>,
        sections: Vec<ReportSection>,
    ) -> Self {
        Self {
            gateway,
            filters,
            sections,
        }
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Resolve a user selection of section ids against the catalog,
    /// keeping catalog order so the document stays logical. Unknown ids
    /// are dropped; an empty selection means every section.
    pub fn resolve_sections(&self, requested: &[String]) -> Vec<ReportSection> {
        if requested.is_empty() {
            return self.sections.clone();
        }
        self.sections
            .iter()
            .filter(|s| requested.iter().any(|id| id == &s.id))
            .cloned()
            .collect()
    }

    /// Assemble the structured report contents. The KPI block comes from a
    /// fetch issued here, so the document is self-consistent even when the
    /// on-screen state is stale.
    pub async fn build(&self, title: &str) -> anyhow::Result<ReportData> {
        let selection = self.filters.selection();
        let overview = self.gateway.kpi_overview(&selection).await?;

        let insight = match InsightService::new(self.gateway.clone()).latest().await {
            Ok(Some(insight)) => Some(ReportInsight {
                title: insight.title,
                content: insight.content,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("insight fetch for report failed, omitting block: {e:#}");
                None
            }
        };

        Ok(ReportData {
            title: title.to_string(),
            generated_on: Local::now().format("%B %-d, %Y").to_string(),
            kpis: KpiCards::from_overview(&overview),
            insight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpi::KpiOverview;
    use crate::infrastructure::mock_gateway::MockGateway;

    fn sections() -> Vec<ReportSection> {
        vec![
            ReportSection {
                id: "kpis".to_string(),
                label: "KPI Overview".to_string(),
                description: String::new(),
            },
            ReportSection {
                id: "charts-main".to_string(),
                label: "Main Charts".to_string(),
                description: String::new(),
            },
            ReportSection {
                id: "charts-region".to_string(),
                label: "Regional Data".to_string(),
                description: String::new(),
            },
        ]
    }

    #[tokio::test]
    async fn test_report_uses_generation_time_fetch() {
        let gateway = Arc::new(MockGateway::new());
        let filters = Arc::new(FilterStore::new());
        let service = ReportService::new(gateway.clone(), filters, sections());

        // The "screen" is stale relative to the backend.
        let stale = KpiOverview {
            total_revenue: 1.0,
            ..Default::default()
        };
        let fresh = gateway.kpi_overview(&Default::default()).await.unwrap();

        let report = service.build("Executive Report").await.unwrap();
        assert_eq!(
            report.kpis,
            KpiCards::from_overview(&fresh),
            "report must reflect the fetch issued during generation"
        );
        assert_ne!(report.kpis, KpiCards::from_overview(&stale));
    }

    #[tokio::test]
    async fn test_report_carries_latest_insight() {
        let service = ReportService::new(
            Arc::new(MockGateway::new()),
            Arc::new(FilterStore::new()),
            sections(),
        );
        let report = service.build("Executive Report").await.unwrap();
        assert!(report.insight.is_some());
    }

    #[test]
    fn test_resolve_sections_keeps_catalog_order() {
        let service = ReportService::new(
            Arc::new(MockGateway::new()),
            Arc::new(FilterStore::new()),
            sections(),
        );

        let resolved = service.resolve_sections(&[
            "charts-region".to_string(),
            "kpis".to_string(),
            "unknown".to_string(),
        ]);
        let ids: Vec<_> = resolved.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["kpis", "charts-region"]);
    }

    #[test]
    fn test_resolve_empty_selection_means_all() {
        let service = ReportService::new(
            Arc::new(MockGateway::new()),
            Arc::new(FilterStore::new()),
            sections(),
        );
        assert_eq!(service.resolve_sections(&[]).len(), 3);
    }
}
