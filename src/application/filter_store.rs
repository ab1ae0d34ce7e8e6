// Filter state store - single source of truth for the active data slice
use crate::application::gateway::AnalyticsGateway;
use crate::domain::filters::{DateRange, FilterCatalog, FilterLabels, FilterSelection, ViewSettings};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Shared filter state, created once per dashboard session. Writes go
/// through the dedicated setters and are pushed to every subscriber via
/// a watch channel; subscribers re-derive their data from the new value.
pub struct FilterStore {
    tx: watch::Sender<FilterSelection>,
    labels: Mutex<FilterLabels>,
    catalog: Mutex<FilterCatalog>,
    labels_requested: AtomicBool,
}

impl FilterStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FilterSelection::default());
        Self {
            tx,
            labels: Mutex::new(FilterLabels::default()),
            catalog: Mutex::new(FilterCatalog::default()),
            labels_requested: AtomicBool::new(false),
        }
    }

    pub fn selection(&self) -> FilterSelection {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every selection change.
    pub fn subscribe(&self) -> watch::Receiver<FilterSelection> {
        self.tx.subscribe()
    }

    pub fn set_category(&self, value: Option<String>) {
        self.tx.send_modify(|s| s.category = value);
    }

    pub fn set_region(&self, value: Option<String>) {
        self.tx.send_modify(|s| s.region = value);
    }

    pub fn set_date_range(&self, range: DateRange) {
        self.tx.send_modify(|s| s.date_range = range);
    }

    pub fn set_min_order_value(&self, value: Option<f64>) {
        self.tx.send_modify(|s| s.min_order_value = value);
    }

    /// Drill-down on a category value: selecting the active value again
    /// clears the axis.
    pub fn toggle_category(&self, name: &str) {
        self.tx.send_modify(|s| {
            if s.category.as_deref() == Some(name) {
                s.category = None;
            } else {
                s.category = Some(name.to_string());
            }
        });
    }

    /// Drill-down on a region value, same toggle semantics as categories.
    pub fn toggle_region(&self, name: &str) {
        self.tx.send_modify(|s| {
            if s.region.as_deref() == Some(name) {
                s.region = None;
            } else {
                s.region = Some(name.to_string());
            }
        });
    }

    pub fn reset(&self) {
        self.tx.send_replace(FilterSelection::default());
    }

    /// Restore a saved view snapshot. Axes are restored exactly as saved,
    /// including unset ones; an absent date range keeps the current token.
    pub fn apply_view(&self, settings: &ViewSettings) {
        self.tx.send_modify(|s| {
            s.category = settings.category.clone();
            s.region = settings.region.clone();
            if let Some(token) = settings.date_range.as_deref()
                && let Some(range) = DateRange::from_token(token)
            {
                s.date_range = range;
            }
        });
    }

    /// Fetch the label dictionary once per store lifetime. Failure is
    /// silent and leaves the generic fallback labels in place; no retry.
    pub async fn load_labels(&self, gateway: &dyn AnalyticsGateway) {
        if self.labels_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        match gateway.filter_catalog().await {
            Ok(catalog) => {
                if let Some(labels) = &catalog.labels {
                    *self.labels.lock().unwrap_or_else(|e| e.into_inner()) = labels.clone();
                }
                *self.catalog.lock().unwrap_or_else(|e| e.into_inner()) = catalog;
            }
            Err(e) => {
                tracing::debug!("filter label fetch failed, using generic labels: {e:#}");
            }
        }
    }

    pub fn labels(&self) -> FilterLabels {
        self.labels.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn catalog(&self) -> FilterCatalog {
        self.catalog.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock_gateway::MockGateway;

    #[test]
    fn test_setters_notify_subscribers() {
        let store = FilterStore::new();
        let mut rx = store.subscribe();

        store.set_region(Some("Asia".to_string()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().region.as_deref(), Some("Asia"));

        store.set_date_range(DateRange::Last7Days);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_drill_toggle_twice_returns_to_unset() {
        let store = FilterStore::new();

        store.toggle_category("Electronics");
        assert_eq!(store.selection().category.as_deref(), Some("Electronics"));

        store.toggle_category("Electronics");
        assert_eq!(store.selection().category, None);
    }

    #[test]
    fn test_drill_switches_between_values() {
        let store = FilterStore::new();

        store.toggle_region("eu");
        store.toggle_region("asia");
        assert_eq!(store.selection().region.as_deref(), Some("asia"));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = FilterStore::new();
        store.set_category(Some("Fashion".to_string()));
        store.set_min_order_value(Some(50.0));
        store.set_date_range(DateRange::Last12Months);

        store.reset();

        let selection = store.selection();
        assert_eq!(selection, FilterSelection::default());
        assert_eq!(selection.date_range, DateRange::Last30Days);
    }

    #[test]
    fn test_apply_view_restores_unset_axes() {
        let store = FilterStore::new();
        store.set_category(Some("Home".to_string()));
        store.set_date_range(DateRange::Last7Days);

        store.apply_view(&ViewSettings {
            category: None,
            region: Some("na".to_string()),
            date_range: Some("90d".to_string()),
        });

        let selection = store.selection();
        assert_eq!(selection.category, None);
        assert_eq!(selection.region.as_deref(), Some("na"));
        assert_eq!(selection.date_range, DateRange::Last90Days);
    }

    #[test]
    fn test_apply_view_without_date_range_keeps_current() {
        let store = FilterStore::new();
        store.set_date_range(DateRange::Last12Months);

        store.apply_view(&ViewSettings {
            category: Some("Beauty".to_string()),
            region: None,
            date_range: None,
        });

        assert_eq!(store.selection().date_range, DateRange::Last12Months);
    }

    #[tokio::test]
    async fn test_label_fetch_failure_keeps_generic_labels() {
        let store = FilterStore::new();
        let gateway = MockGateway::failing();

        store.load_labels(&gateway).await;

        let labels = store.labels();
        assert_eq!(labels.category, "Category");
        assert_eq!(labels.region, "Region");
    }

    #[tokio::test]
    async fn test_labels_loaded_once() {
        let store = FilterStore::new();
        let gateway = MockGateway::new();

        store.load_labels(&gateway).await;
        assert_eq!(store.labels().category, "Product Line");

        // Second call is a no-op even if the backend answer changed
        store.load_labels(&MockGateway::failing()).await;
        assert_eq!(store.labels().category, "Product Line");
    }
}
