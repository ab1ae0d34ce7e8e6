// Filter selection domain model
use serde::{Deserialize, Serialize};

/// Enumerated date-range tokens accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    Last7Days,
    #[default]
    Last30Days,
    Last90Days,
    Last12Months,
    All,
}

impl DateRange {
    pub fn token(&self) -> &'static str {
        match self {
            DateRange::Last7Days => "7d",
            DateRange::Last30Days => "30d",
            DateRange::Last90Days => "90d",
            DateRange::Last12Months => "12m",
            DateRange::All => "all",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "7d" => Some(DateRange::Last7Days),
            "30d" => Some(DateRange::Last30Days),
            "90d" => Some(DateRange::Last90Days),
            "12m" => Some(DateRange::Last12Months),
            "all" => Some(DateRange::All),
            _ => None,
        }
    }

    /// Number of days covered, or None for an unbounded range.
    pub fn days(&self) -> Option<u32> {
        match self {
            DateRange::Last7Days => Some(7),
            DateRange::Last30Days => Some(30),
            DateRange::Last90Days => Some(90),
            DateRange::Last12Months => Some(365),
            DateRange::All => None,
        }
    }
}

/// The current data slice. At most one value per axis; None means
/// "no restriction".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSelection {
    pub category: Option<String>,
    pub region: Option<String>,
    pub date_range: DateRange,
    pub min_order_value: Option<f64>,
}

impl FilterSelection {
    /// True when a category or region slice is active. Live KPI updates
    /// are global aggregates and must not overwrite a sliced view.
    pub fn is_sliced(&self) -> bool {
        self.category.is_some() || self.region.is_some()
    }

    /// Serialize the set axes as query parameters. Unset axes and the
    /// unbounded date range are omitted entirely.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(region) = &self.region {
            params.push(("region", region.clone()));
        }
        if let Some(days) = self.date_range.days() {
            params.push(("days", days.to_string()));
        }
        if let Some(min) = self.min_order_value {
            params.push(("min_order_value", min.to_string()));
        }
        params
    }
}

/// Axis labels for the current dataset, fetched once per session.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FilterLabels {
    pub category: String,
    pub region: String,
}

impl Default for FilterLabels {
    fn default() -> Self {
        Self {
            category: "Category".to_string(),
            region: "Region".to_string(),
        }
    }
}

/// Filter options advertised by the gateway.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilterCatalog {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub labels: Option<FilterLabels>,
}

/// A saved view as stored by the gateway. `settings` is the serialized
/// filter snapshot, kept as an opaque string on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedView {
    pub id: i64,
    pub name: String,
    pub settings: String,
}

/// The filter snapshot carried inside a saved view. Unset axes are
/// serialized as explicit nulls so a load restores them as unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewSettings {
    pub category: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "dateRange")]
    pub date_range: Option<String>,
}

impl ViewSettings {
    pub fn snapshot(selection: &FilterSelection) -> Self {
        Self {
            category: selection.category.clone(),
            region: selection.region.clone(),
            date_range: Some(selection.date_range.token().to_string()),
        }
    }

    pub fn encode(&self) -> String {
        // Flat Option fields only, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(settings: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(settings)
    }
}
