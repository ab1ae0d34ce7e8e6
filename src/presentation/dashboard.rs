// Dashboard session - wires the filter store, views, and live channel
use crate::application::breakdown_service::{BreakdownAxis, BreakdownService};
use crate::application::filter_store::FilterStore;
use crate::application::gateway::AnalyticsGateway;
use crate::application::insight_service::InsightService;
use crate::application::overview_service::OverviewService;
use crate::application::saved_views_service::SavedViewsService;
use crate::application::trend_service::TrendService;
use crate::domain::filters::DateRange;
use crate::domain::kpi::{AiInsight, LiveUpdate};
use crate::domain::report::{KpiCards, RenderedRegion, format_currency};
use crate::infrastructure::kpi_stream::KpiStream;
use crate::presentation::capture::{RegionSource, base_size, regions, sections};
use crate::presentation::chart_render;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncBufReadExt;

/// One dashboard session: the shared filter store, every data-fetching
/// view, and the insight feed. Also the capture source for reports, since
/// it owns whatever is currently "on screen".
pub struct DashboardApp {
    gateway: Arc<dyn AnalyticsGateway>,
    pub filters: Arc<FilterStore>,
    pub overview: Arc<OverviewService>,
    pub trend: Arc<TrendService>,
    pub categories: Arc<BreakdownService>,
    pub regions: Arc<BreakdownService>,
    pub insights: InsightService,
    pub saved_views: SavedViewsService,
    insight_feed: Mutex<Vec<AiInsight>>,
}

impl DashboardApp {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>, filters: Arc<FilterStore>) -> Self {
        Self {
            overview: Arc::new(OverviewService::new(gateway.clone(), filters.clone())),
            trend: Arc::new(TrendService::new(gateway.clone(), filters.clone())),
            categories: Arc::new(BreakdownService::new(
                BreakdownAxis::Category,
                gateway.clone(),
                filters.clone(),
            )),
            regions: Arc::new(BreakdownService::new(
                BreakdownAxis::Region,
                gateway.clone(),
                filters.clone(),
            )),
            insights: InsightService::new(gateway.clone()),
            saved_views: SavedViewsService::new(gateway.clone(), filters.clone()),
            insight_feed: Mutex::new(Vec::new()),
            filters,
            gateway,
        }
    }

    /// First load: labels once, then every view plus the insight feed.
    pub async fn initial_load(&self) {
        self.filters.load_labels(self.gateway.as_ref()).await;
        self.refresh_views().await;
        match self.insights.feed().await {
            Ok(feed) => *self.lock_feed() = feed,
            Err(e) => tracing::warn!("insight feed fetch failed: {e:#}"),
        }
    }

    /// Re-derive every view from the current selection.
    pub async fn refresh_views(&self) {
        tokio::join!(
            self.overview.refresh(),
            self.trend.refresh(),
            self.categories.refresh(),
            self.regions.refresh(),
        );
    }

    /// Event loop: stdin commands drive the filters, filter changes
    /// re-trigger fetches, live updates merge into the overview, and
    /// ctrl-c tears the session down (closing the socket with it).
    pub async fn run(&self, mut stream: KpiStream) -> anyhow::Result<()> {
        let mut filter_rx = self.filters.subscribe();
        let mut stream_open = true;
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        println!("{}", self.summary_line());
        println!("commands: category/region <value>, range <token>, min <value>, reset,");
        println!("          forecast on|off, explain trend|category|region, filters,");
        println!("          save <name>, views, load <id>, status, quit");

        loop {
            tokio::select! {
                changed = filter_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    tracing::debug!("filters changed, re-fetching views");
                    self.refresh_views().await;
                    println!("{}", self.summary_line());
                }
                update = stream.next(), if stream_open => {
                    match update {
                        Some(LiveUpdate::KpiUpdate { payload }) => {
                            if self.overview.apply_live(&payload) {
                                println!("{} (live)", self.summary_line());
                            }
                        }
                        Some(LiveUpdate::Unknown) => {}
                        None => {
                            tracing::info!("live update channel closed");
                            stream_open = false;
                        }
                    }
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if !self.handle_command(line.trim(), &stream).await {
                                break;
                            }
                        }
                        Ok(None) | Err(_) => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down dashboard session");
                    break;
                }
            }
        }

        stream.close();
        Ok(())
    }

    /// One stdin command; returns false when the session should end.
    async fn handle_command(&self, line: &str, stream: &KpiStream) -> bool {
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match (command, rest) {
            ("quit", _) | ("exit", _) => return false,
            ("", _) => {}
            ("category", "clear") => self.filters.set_category(None),
            ("category", value) if !value.is_empty() => self.categories.drill(value),
            ("region", "clear") => self.filters.set_region(None),
            ("region", value) if !value.is_empty() => self.regions.drill(value),
            ("range", token) => match DateRange::from_token(token) {
                Some(range) => self.filters.set_date_range(range),
                None => println!("unknown range '{token}' (7d, 30d, 90d, 12m, all)"),
            },
            ("min", "clear") => self.filters.set_min_order_value(None),
            ("min", value) => match value.parse::<f64>() {
                Ok(min) => self.filters.set_min_order_value(Some(min)),
                Err(_) => println!("'{value}' is not a number"),
            },
            ("reset", _) => self.filters.reset(),
            ("forecast", "on") => self.trend.set_forecast(true).await,
            ("forecast", "off") => self.trend.set_forecast(false).await,
            ("explain", chart) => {
                let explanation = match chart {
                    "trend" => self.trend.open_insight().await,
                    "category" => self.categories.open_insight().await,
                    "region" => self.regions.open_insight().await,
                    _ => {
                        println!("explain what? (trend, category, region)");
                        None
                    }
                };
                if let Some(text) = explanation {
                    println!("AI analysis: {text}");
                }
                // The affordance closes right away in a terminal session,
                // so the cached text never outlives the toggle.
                self.trend.close_insight();
                self.categories.close_insight();
                self.regions.close_insight();
            }
            ("filters", _) => {
                let labels = self.filters.labels();
                let catalog = self.filters.catalog();
                println!(
                    "{}: {:?} | {}: {:?}",
                    labels.category, catalog.categories, labels.region, catalog.regions
                );
                println!("selection: {:?}", self.filters.selection());
            }
            ("save", name) => match self.saved_views.save(name).await {
                Ok(view) => println!("saved view #{} '{}'", view.id, view.name),
                Err(e) => println!("save failed: {e:#}"),
            },
            ("views", _) => match self.saved_views.list().await {
                Ok(views) if views.is_empty() => println!("no saved views"),
                Ok(views) => {
                    for view in views {
                        println!("  #{} {}", view.id, view.name);
                    }
                }
                Err(e) => println!("listing views failed: {e:#}"),
            },
            ("load", id) => match id.parse::<i64>() {
                Ok(id) => match self.saved_views.list().await {
                    Ok(views) => match views.iter().find(|v| v.id == id) {
                        Some(view) => {
                            if let Err(e) = self.saved_views.load(view) {
                                println!("load failed: {e:#}");
                            }
                        }
                        None => println!("no saved view with id {id}"),
                    },
                    Err(e) => println!("listing views failed: {e:#}"),
                },
                Err(_) => println!("'{id}' is not a view id"),
            },
            ("status", _) => {
                println!("{} | channel {:?}", self.summary_line(), stream.state());
            }
            _ => println!("unknown command '{command}'"),
        }
        true
    }

    /// One-line KPI readout for the session log.
    pub fn summary_line(&self) -> String {
        match self.overview.current() {
            Some(overview) => format!(
                "revenue {} | orders {} | aov {} | customers {}",
                format_currency(overview.total_revenue),
                overview.active_orders,
                format_currency(overview.average_order_value),
                overview.active_customers,
            ),
            None => "no KPI data loaded yet".to_string(),
        }
    }

    pub fn insight_feed(&self) -> Vec<AiInsight> {
        self.lock_feed().clone()
    }

    fn lock_feed(&self) -> std::sync::MutexGuard<'_, Vec<AiInsight>> {
        self.insight_feed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RegionSource for DashboardApp {
    /// Rasterize a named region from the state the views hold right now.
    /// A view that never loaded data is not mounted and yields None.
    fn capture(&self, id: &str, scale: u32) -> Option<RenderedRegion> {
        let (w, h) = base_size(id);
        let (w, h) = (w * scale, h * scale);

        match id {
            sections::KPIS => self
                .overview
                .current()
                .map(|o| chart_render::render_kpi_cards(&KpiCards::from_overview(&o), w, h)),
            sections::CHARTS_MAIN => self.trend.has_data().then(|| {
                chart_render::render_main_charts(
                    &self.trend.chart_data(),
                    &self.categories.window(),
                    w,
                    h,
                )
            }),
            regions::REVENUE_TREND => self
                .trend
                .has_data()
                .then(|| chart_render::render_trend(&self.trend.chart_data(), w, h)),
            regions::CATEGORY => self.categories.has_data().then(|| {
                chart_render::render_bars(&self.categories.window(), "Sales by Category", w, h)
            }),
            sections::CHARTS_REGION | regions::REGION => self.regions.has_data().then(|| {
                chart_render::render_pie(&self.regions.slices(), "Regional Distribution", w, h)
            }),
            sections::AI_INSIGHTS => {
                let feed = self.insight_feed();
                (!feed.is_empty()).then(|| chart_render::render_insights(&feed, w, h))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock_gateway::MockGateway;
    use crate::presentation::capture::CAPTURE_SCALE;

    fn app() -> DashboardApp {
        DashboardApp::new(Arc::new(MockGateway::new()), Arc::new(FilterStore::new()))
    }

    #[tokio::test]
    async fn test_regions_unmounted_before_initial_load() {
        let app = app();
        assert!(app.capture(sections::KPIS, CAPTURE_SCALE).is_none());
        assert!(app.capture(regions::REVENUE_TREND, CAPTURE_SCALE).is_none());
    }

    #[tokio::test]
    async fn test_regions_mounted_after_initial_load() {
        let app = app();
        app.initial_load().await;

        for id in [
            sections::KPIS,
            sections::CHARTS_MAIN,
            sections::CHARTS_REGION,
            sections::AI_INSIGHTS,
            regions::REVENUE_TREND,
            regions::CATEGORY,
            regions::REGION,
        ] {
            let region = app.capture(id, CAPTURE_SCALE);
            assert!(region.is_some(), "region '{id}' should be mounted");
            let (w, h) = base_size(id);
            let region = region.unwrap();
            assert_eq!(region.width, w * CAPTURE_SCALE);
            assert_eq!(region.height, h * CAPTURE_SCALE);
        }
    }

    #[tokio::test]
    async fn test_unknown_region_yields_none() {
        let app = app();
        app.initial_load().await;
        assert!(app.capture("sidebar", CAPTURE_SCALE).is_none());
    }

    #[tokio::test]
    async fn test_summary_line_tracks_overview() {
        let app = app();
        assert_eq!(app.summary_line(), "no KPI data loaded yet");
        app.initial_load().await;
        assert!(app.summary_line().contains("revenue $52,450"));
    }
}
