// Overview view - KPI snapshot with live-update merging
use crate::application::filter_store::FilterStore;
use crate::application::gateway::AnalyticsGateway;
use crate::domain::kpi::{KpiDelta, KpiOverview};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Holds the KPI snapshot for the current filter selection. The previous
/// snapshot stays visible while a refetch is in flight, and a failed fetch
/// leaves it untouched.
pub struct OverviewService {
    gateway: Arc<dyn AnalyticsGateway>,
    filters: Arc<FilterStore>,
    state: Mutex<Option<KpiOverview>>,
    seq: AtomicU64,
}

impl OverviewService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>, filters: Arc<FilterStore>) -> Self {
        Self {
            gateway,
            filters,
            state: Mutex::new(None),
            seq: AtomicU64::new(0),
        }
    }

    /// Re-request the snapshot for the current selection. Responses that
    /// lost the race to a later request are discarded.
    pub async fn refresh(&self) {
        let issued = self.begin_request();
        let selection = self.filters.selection();

        match self.gateway.kpi_overview(&selection).await {
            Ok(overview) => {
                self.apply_fetched(issued, overview);
            }
            Err(e) => {
                tracing::warn!("overview fetch failed, keeping previous snapshot: {e:#}");
            }
        }
    }

    fn begin_request(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply_fetched(&self, issued: u64, overview: KpiOverview) -> bool {
        if issued != self.seq.load(Ordering::SeqCst) {
            tracing::debug!(seq = issued, "discarding stale overview response");
            return false;
        }
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(overview);
        true
    }

    /// Merge a live KPI delta. The stream carries global aggregates, so a
    /// message is dropped whenever a category or region slice is active.
    pub fn apply_live(&self, delta: &KpiDelta) -> bool {
        if self.filters.selection().is_sliced() {
            tracing::debug!("ignoring live update while a slice is active");
            return false;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut overview = state.take().unwrap_or_default();
        delta.apply_to(&mut overview);
        *state = Some(overview);
        true
    }

    pub fn current(&self) -> Option<KpiOverview> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[cfg(test)]
    fn set_current(&self, overview: KpiOverview) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(overview);
    }
}
