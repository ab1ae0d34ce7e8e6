use crate::domain::report::ReportSection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub reconnect: ReconnectSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub ws_url: String,
}

/// Live-channel reconnect policy. Disabled by default: a dropped stream
/// stays closed until the next session.
#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_secs: default_initial_delay(),
            max_delay_secs: default_max_delay(),
        }
    }
}

fn default_initial_delay() -> u64 {
    1
}

fn default_max_delay() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    #[serde(default = "default_session_path")]
    pub path: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> String {
    ".commerce-insights/session.toml".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportToml {
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SectionConfig {
    pub id: String,
    pub label: String,
    pub description: String,
}

impl From<SectionConfig> for ReportSection {
    fn from(section: SectionConfig) -> Self {
        ReportSection {
            id: section.id,
            label: section.label,
            description: section.description,
        }
    }
}

pub fn load_gateway_config() -> anyhow::Result<GatewayConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/gateway"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_report_sections() -> anyhow::Result<Vec<ReportSection>> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/report"))
        .build()?;

    let report: ReportToml = settings.try_deserialize()?;
    Ok(report.sections.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_reconnect_defaults_off() {
        let raw = r#"
            [gateway]
            base_url = "http://localhost:8000/api"
            ws_url = "ws://localhost:8000/ws/kpi-stream"
        "#;
        let parsed: GatewayConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(!parsed.reconnect.enabled);
        assert_eq!(parsed.reconnect.initial_delay_secs, 1);
        assert_eq!(parsed.reconnect.max_delay_secs, 30);
        assert_eq!(parsed.session.path, default_session_path());
    }

    #[test]
    fn test_report_sections_parse() {
        let raw = r#"
            [[sections]]
            id = "kpis"
            label = "KPI Overview"
            description = "Total Revenue, Orders, AOV, Customers"

            [[sections]]
            id = "charts-main"
            label = "Main Charts"
            description = "Revenue Trends & Category Analysis"
        "#;
        let report: ReportToml = config::Config::builder()
            .add_source(config::File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let sections: Vec<ReportSection> = report.sections.into_iter().map(Into::into).collect();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "kpis");
        assert_eq!(sections[1].label, "Main Charts");
    }
}
