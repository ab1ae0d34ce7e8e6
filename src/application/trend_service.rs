// Trend view - revenue over time with optional forecast overlay
use crate::application::filter_store::FilterStore;
use crate::application::gateway::{AnalyticsGateway, ExplainRequest};
use crate::domain::kpi::TrendPoint;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const FORECAST_DAYS: u32 = 30;

#[derive(Default)]
struct TrendState {
    history: Vec<TrendPoint>,
    forecast: Vec<TrendPoint>,
    show_forecast: bool,
    insight: Option<String>,
    insight_open: bool,
}

/// The revenue trend series plus the forecast continuation joined at the
/// last historical point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendChartData {
    pub history: Vec<TrendPoint>,
    pub forecast: Vec<TrendPoint>,
}

pub struct TrendService {
    gateway: Arc<dyn AnalyticsGateway>,
    filters: Arc<FilterStore>,
    state: Mutex<TrendState>,
    seq: AtomicU64,
}

impl TrendService {
    pub fn new(gateway: Arc<dyn AnalyticsGateway>, filters: Arc<FilterStore>) -> Self {
        Self {
            gateway,
            filters,
            state: Mutex::new(TrendState::default()),
            seq: AtomicU64::new(0),
        }
    }

    pub async fn refresh(&self) {
        let issued = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let selection = self.filters.selection();

        match self.gateway.revenue_trend(&selection).await {
            Ok(history) => {
                if issued != self.seq.load(Ordering::SeqCst) {
                    tracing::debug!(seq = issued, "discarding stale trend response");
                    return;
                }
                self.lock().history = history;
            }
            Err(e) => {
                tracing::warn!("trend fetch failed, keeping previous series: {e:#}");
            }
        }
    }

    /// Toggle the forecast overlay. The forecast series is fetched once
    /// on first enable and reused for the rest of the session.
    pub async fn set_forecast(&self, show: bool) {
        let needs_fetch = {
            let mut state = self.lock();
            state.show_forecast = show;
            show && state.forecast.is_empty()
        };
        if !needs_fetch {
            return;
        }
        match self.gateway.revenue_forecast(FORECAST_DAYS).await {
            Ok(forecast) => self.lock().forecast = forecast,
            Err(e) => tracing::warn!("forecast fetch failed: {e:#}"),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.lock().history.is_empty()
    }

    /// Series as rendered: history, plus (when toggled on) the forecast
    /// prefixed with a connection point at the last historical value.
    pub fn chart_data(&self) -> TrendChartData {
        let state = self.lock();
        if !state.show_forecast || state.forecast.is_empty() {
            return TrendChartData {
                history: state.history.clone(),
                forecast: Vec::new(),
            };
        }
        let mut forecast = Vec::with_capacity(state.forecast.len() + 1);
        if let Some(last) = state.history.last() {
            forecast.push(last.clone());
        }
        forecast.extend(state.forecast.iter().cloned());
        TrendChartData {
            history: state.history.clone(),
            forecast,
        }
    }

    /// Open the AI explanation affordance. The returned text is cached
    /// only while the toggle stays open; closing clears it and the next
    /// open re-fetches.
    pub async fn open_insight(&self) -> Option<String> {
        let (cached, request) = {
            let mut state = self.lock();
            state.insight_open = true;
            if state.history.is_empty() {
                return None;
            }
            match &state.insight {
                Some(text) => (Some(text.clone()), None),
                None => (None, Some(Self::explain_request(&state))),
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
                tracing::warn!("trend explanation fetch failed: {e:#}");
                Some("Could not generate explanation.".to_string())
            }
        }
    }

    pub fn close_insight(&self) {
        let mut state = self.lock();
        state.insight_open = false;
        state.insight = None;
    }

    /// Compact numeric summary of the displayed series, submitted as the
    /// explanation context.
    fn explain_request(state: &TrendState) -> ExplainRequest {
        let values: Vec<f64> = state.history.iter().map(|p| p.revenue).collect();
        let first = state.history.first();
        let last = state.history.last();
        let context = json!({
            "start_date": first.map(|p| p.date.clone()),
            "end_date": last.map(|p| p.date.clone()),
            "start_revenue": values.first().copied(),
            "end_revenue": values.last().copied(),
            "max_revenue": values.iter().cloned().fold(f64::MIN, f64::max),
            "min_revenue": values.iter().cloned().fold(f64::MAX, f64::min),
            "showing_forecast": state.show_forecast,
        });
        ExplainRequest {
            chart_name: "Revenue Trend Over Time".to_string(),
            context,
            selected_item: if state.show_forecast {
                "With 30-Day Forecast".to_string()
            } else {
                "Historical Trend".to_string()
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
