// Presentation layer - Offscreen rendering and session wiring
pub mod capture;
pub mod chart_render;
pub mod dashboard;
pub mod report_pdf;
