// Application layer - Use cases and view services
pub mod alerts_service;
pub mod analytics_service;
pub mod breakdown_service;
pub mod filter_store;
pub mod gateway;
pub mod insight_service;
pub mod integration_service;
pub mod overview_service;
pub mod report_service;
pub mod saved_views_service;
pub mod trend_service;
