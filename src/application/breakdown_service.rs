// Breakdown views - revenue by category/region with drill interaction
use crate::application::filter_store::FilterStore;
use crate::application::gateway::{AnalyticsGateway, ExplainRequest};
use crate::domain::filters::FilterSelection;
use crate::domain::kpi::SlicePoint;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Sliding-window size for bar displays.
const BAR_WINDOW: usize = 7;

/// Values submitted with an explanation request.
const EXPLAIN_TOP_N: usize = 5;

/// Which filter axis this breakdown drills on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownAxis {
    Category,
    Region,
}

impl BreakdownAxis {
    fn chart_name(&self) -> &'static str {
        match self {
            BreakdownAxis::Category => "Revenue by Category",
            BreakdownAxis::Region => "Revenue by Region",
        }
    }
}

#[derive(Default)]
struct BreakdownState {
    slices: Vec<SlicePoint>,
    insight: Option<String>,
    insight_open: bool,
}

/// One breakdown view (bar or pie). Drilling a slice pushes the value
/// back into the filter store, which re-triggers every dependent view.
pub struct BreakdownService {
    axis: BreakdownAxis,
    gateway: Arc<dyn AnalyticsGateway>,
    filters: Arc<FilterStore>,
    state: Mutex<BreakdownState>,
    seq: AtomicU64,
}

impl BreakdownService {
    pub fn new(
        axis: BreakdownAxis,
        gateway: Arc<dyn AnalyticsGateway>,
        filters: Arc<FilterStore>,
    ) -> Self {
        Self {
            axis,
            gateway,
            filters,
            state: Mutex::new(BreakdownState::default()),
            seq: AtomicU64::new(0),
        }
    }

    /// The request carries every axis except this view's own: a breakdown
    /// is always computed across its full axis.
    fn request_selection(&self) -> FilterSelection {
        let mut selection = self.filters.selection();
        match self.axis {
            BreakdownAxis::Category => selection.category = None,
            BreakdownAxis::Region => selection.region = None,
        }
        selection
    }

    pub async fn refresh(&self) {
        let issued = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let selection = self.request_selection();

        let fetched = match self.axis {
            BreakdownAxis::Category => self.gateway.revenue_by_category(&selection).await,
            BreakdownAxis::Region => self.gateway.revenue_by_region(&selection).await,
        };

        match fetched {
            Ok(slices) => {
                if issued != self.seq.load(Ordering::SeqCst) {
                    tracing::debug!(seq = issued, "discarding stale breakdown response");
                    return;
                }
                self.lock().slices = slices;
            }
            Err(e) => {
                tracing::warn!("breakdown fetch failed, keeping previous slices: {e:#}");
            }
        }
    }

    pub fn has_data(&self) -> bool {
        !self.lock().slices.is_empty()
    }

    /// Currently selected value on this view's axis, if any.
    pub fn selected(&self) -> Option<String> {
        let selection = self.filters.selection();
        match self.axis {
            BreakdownAxis::Category => selection.category,
            BreakdownAxis::Region => selection.region,
        }
    }

    /// Drill into a slice; drilling the active slice again clears it.
    pub fn drill(&self, name: &str) {
        match self.axis {
            BreakdownAxis::Category => self.filters.toggle_category(name),
            BreakdownAxis::Region => self.filters.toggle_region(name),
        }
    }

    pub fn slices(&self) -> Vec<SlicePoint> {
        self.lock().slices.clone()
    }

    /// Fixed-size display window. The leading entries are shown unless the
    /// selected slice would fall outside; then the window recenters on it.
    pub fn window(&self) -> Vec<SlicePoint> {
        let slices = self.lock().slices.clone();
        windowed(slices, self.selected().as_deref(), BAR_WINDOW)
    }

    /// Open the AI explanation affordance; cached only while open.
    pub async fn open_insight(&self) -> Option<String> {
        let (cached, request) = {
            let mut state = self.lock();
            state.insight_open = true;
            if state.slices.is_empty() {
                return None;
            }
            match &state.insight {
                Some(text) => (Some(text.clone()), None),
                None => (
                    None,
                    Some(self.explain_request(&state.slices, self.selected())),
                ),
            }
        };
        if let Some(text) = cached {
            return Some(text);
        }
        let request = request?;

        match self.gateway.explain_chart(&request).await {
            Ok(text) => {
                let mut state = self.lock();
                if state.insight_open {
                    state.insight = Some(text.clone());
                }
                Some(text)
            }
            Err(e) => {
                tracing::warn!("breakdown explanation fetch failed: {e:#}");
                Some("Could not generate explanation.".to_string())
            }
        }
    }

    pub fn close_insight(&self) {
        let mut state = self.lock();
        state.insight_open = false;
        state.insight = None;
    }

    fn explain_request(&self, slices: &[SlicePoint], selected: Option<String>) -> ExplainRequest {
        let top: Vec<_> = slices
            .iter()
            .take(EXPLAIN_TOP_N)
            .map(|s| json!({"name": s.name, "value": s.value}))
            .collect();
        ExplainRequest {
            chart_name: self.axis.chart_name().to_string(),
            context: json!({
                "top_values": top,
                "total_slices": slices.len(),
            }),
            selected_item: selected.unwrap_or_else(|| "All".to_string()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakdownState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Truncate to `size` entries; recenter around the selected item when it
/// would otherwise fall outside the leading window.
fn windowed(slices: Vec<SlicePoint>, selected: Option<&str>, size: usize) -> Vec<SlicePoint> {
    if slices.len() <= size {
        return slices;
    }
    let selected_idx = selected.and_then(|name| slices.iter().position(|s| s.name == name));
    let start = match selected_idx {
        Some(idx) if idx >= size => (idx - size / 2).min(slices.len() - size),
        _ => 0,
    };
    slices[start..start + size].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock_gateway::MockGateway;

    fn slices(n: usize) -> Vec<SlicePoint> {
        (0..n)
            .map(|i| SlicePoint {
                name: format!("slice-{i}"),
                value: (i as f64 + 1.0) * 100.0,
            })
            .collect()
    }

    fn service(axis: BreakdownAxis) -> (BreakdownService, Arc<FilterStore>) {
        let filters = Arc::new(FilterStore::new());
        let service = BreakdownService::new(axis, Arc::new(MockGateway::new()), filters.clone());
        (service, filters)
    }

    #[test]
    fn test_window_truncates_to_seven() {
        let windowed = windowed(slices(12), None, BAR_WINDOW);
        assert_eq!(windowed.len(), 7);
        assert_eq!(windowed[0].name, "slice-0");
    }

    #[test]
    fn test_window_recenters_on_out_of_window_selection() {
        let windowed = windowed(slices(12), Some("slice-9"), BAR_WINDOW);
        assert_eq!(windowed.len(), 7);
        assert!(windowed.iter().any(|s| s.name == "slice-9"));
        assert_eq!(windowed[0].name, "slice-5");
    }

    #[test]
    fn test_window_clamps_near_tail() {
        let windowed = windowed(slices(12), Some("slice-11"), BAR_WINDOW);
        assert_eq!(windowed.len(), 7);
        assert_eq!(windowed.last().unwrap().name, "slice-11");
    }

    #[test]
    fn test_window_keeps_leading_entries_for_visible_selection() {
        let windowed = windowed(slices(12), Some("slice-2"), BAR_WINDOW);
        assert_eq!(windowed[0].name, "slice-0");
    }

    #[test]
    fn test_short_lists_pass_through() {
        assert_eq!(windowed(slices(4), None, BAR_WINDOW).len(), 4);
    }

    #[tokio::test]
    async fn test_category_request_excludes_own_axis() {
        let (service, filters) = service(BreakdownAxis::Category);
        filters.set_category(Some("Electronics".to_string()));
        filters.set_region(Some("Asia".to_string()));

        let selection = service.request_selection();
        assert_eq!(selection.category, None);
        assert_eq!(selection.region.as_deref(), Some("Asia"));

        let params = selection.query_params();
        assert!(params.contains(&("region", "Asia".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "category"));
    }

    #[tokio::test]
    async fn test_drill_round_trip_through_store() {
        let (service, filters) = service(BreakdownAxis::Region);

        service.drill("asia");
        assert_eq!(filters.selection().region.as_deref(), Some("asia"));

        service.drill("asia");
        assert_eq!(filters.selection().region, None);
    }

    #[tokio::test]
    async fn test_refresh_populates_slices() {
        let (service, _filters) = service(BreakdownAxis::Category);
        service.refresh().await;
        assert!(service.has_data());
    }

    #[tokio::test]
    async fn test_explain_request_reports_top_values() {
        let (service, _filters) = service(BreakdownAxis::Category);
        let request = service.explain_request(&slices(8), Some("slice-1".to_string()));

        assert_eq!(request.chart_name, "Revenue by Category");
        assert_eq!(request.selected_item, "slice-1");
        assert_eq!(request.context["total_slices"], 8);
        assert_eq!(
            request.context["top_values"].as_array().unwrap().len(),
            EXPLAIN_TOP_N
        );
    }
}
