// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_gateway;
pub mod kpi_stream;
pub mod mock_gateway;
pub mod session_store;
