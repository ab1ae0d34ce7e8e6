// Main entry point - CLI and dependency injection
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::application::alerts_service::AlertsService;
use crate::application::analytics_service::AnalyticsService;
use crate::application::filter_store::FilterStore;
use crate::application::gateway::AnalyticsGateway;
use crate::application::insight_service::InsightService;
use crate::application::integration_service::IntegrationService;
use crate::application::report_service::ReportService;
use crate::application::saved_views_service::SavedViewsService;
use crate::domain::analytics::NewAlertRule;
use crate::domain::filters::DateRange;
use crate::domain::report::format_currency;
use crate::infrastructure::config::{load_gateway_config, load_report_sections};
use crate::infrastructure::http_gateway::HttpGateway;
use crate::infrastructure::kpi_stream::KpiStream;
use crate::infrastructure::mock_gateway::MockGateway;
use crate::infrastructure::session_store::SessionStore;
use crate::presentation::dashboard::DashboardApp;
use crate::presentation::report_pdf::{save_document, snapshot_document, structured_document};

#[derive(Parser)]
#[command(name = "commerce-insights", about = "Business intelligence dashboard client")]
struct Cli {
    /// Use the built-in fixture gateway instead of the remote backend
    #[arg(long, global = true)]
    offline: bool,

    /// Start with a category slice active
    #[arg(long, global = true)]
    category: Option<String>,

    /// Start with a region slice active
    #[arg(long, global = true)]
    region: Option<String>,

    /// Date range token: 7d, 30d, 90d, 12m or all
    #[arg(long, global = true)]
    range: Option<String>,

    /// Only count orders at or above this value
    #[arg(long, global = true)]
    min_order: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live dashboard session
    Run,
    /// Generate the structured executive report PDF
    Export {
        #[arg(long, default_value = "Executive_Report.pdf")]
        out: PathBuf,
        #[arg(long, default_value = "Executive Report")]
        title: String,
    },
    /// Capture dashboard sections as a snapshot PDF
    Snapshot {
        #[arg(long, default_value = "Custom_Report.pdf")]
        out: PathBuf,
        /// Section ids to include; all sections when omitted
        sections: Vec<String>,
    },
    /// Print the analytics tables (affinity, retention, marketing)
    Analytics,
    /// List alert rules and notifications
    Alerts {
        /// Trigger an evaluation run first
        #[arg(long)]
        run: bool,
        /// Create a rule as name:metric:condition:threshold
        #[arg(long)]
        create: Option<String>,
    },
    /// Show the AI insight feed and a period comparison
    Insights,
    /// Manage saved filter views
    Views {
        #[command(subcommand)]
        action: ViewsAction,
    },
    /// Profile a CSV file through the gateway
    Upload { file: PathBuf },
    /// Ask the data assistant a question
    Ask { question: String },
    /// Store the gateway bearer token for future calls
    Login { token: String },
    /// Connect a data provider
    Connect { provider: String },
    /// Sync a connected provider
    Sync { provider: String },
}

#[derive(Subcommand)]
enum ViewsAction {
    List,
    Save { name: String },
    Load { id: i64 },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_gateway_config()?;
    let sections = load_report_sections()?;

    let session = Arc::new(SessionStore::load(&config.session.path));
    let gateway: Arc<dyn AnalyticsGateway> = if cli.offline {
        Arc::new(MockGateway::new())
    } else {
        Arc::new(HttpGateway::new(&config.gateway.base_url, session.clone()))
    };
    let filters = Arc::new(FilterStore::new());
    if let Some(category) = cli.category {
        filters.set_category(Some(category));
    }
    if let Some(region) = cli.region {
        filters.set_region(Some(region));
    }
    if let Some(token) = &cli.range {
        let range = DateRange::from_token(token)
            .ok_or_else(|| anyhow::anyhow!("unknown date range '{token}'"))?;
        filters.set_date_range(range);
    }
    if let Some(min_order) = cli.min_order {
        filters.set_min_order_value(Some(min_order));
    }

    match cli.command {
        Command::Run => {
            let app = DashboardApp::new(gateway, filters);
            app.initial_load().await;

            let stream = KpiStream::open(&config.gateway.ws_url, config.reconnect.clone());
            app.run(stream).await?;
        }
        Command::Export { out, title } => {
            let app = DashboardApp::new(gateway.clone(), filters.clone());
            app.initial_load().await;

            let reports = ReportService::new(gateway, filters, sections);
            let data = reports.build(&title).await?;
            let bytes = structured_document(&data, &app)?;
            save_document(&bytes, &out)?;
            println!("Report saved to {}", out.display());
        }
        Command::Snapshot {
            out,
            sections: requested,
        } => {
            let app = DashboardApp::new(gateway.clone(), filters.clone());
            app.initial_load().await;

            let reports = ReportService::new(gateway, filters, sections);
            let selected = reports.resolve_sections(&requested);
            match snapshot_document(&selected, &app)? {
                Some(bytes) => {
                    save_document(&bytes, &out)?;
                    println!("Snapshot saved to {}", out.display());
                }
                None => println!("Nothing to capture."),
            }
        }
        Command::Analytics => {
            let analytics = AnalyticsService::new(gateway);

            println!("Product affinity");
            for pair in analytics.affinity().await? {
                println!(
                    "  {} + {}  lift {:.2}  confidence {:.1}%  ({})",
                    pair.product_a,
                    pair.product_b,
                    pair.lift,
                    pair.confidence,
                    pair.strength.as_deref().unwrap_or("-"),
                );
            }

            println!("\nCohort retention");
            for row in analytics.retention().await? {
                let cells: Vec<String> = row
                    .retention
                    .iter()
                    .map(|c| format!("p{} {:.0}%", c.period, c.rate))
                    .collect();
                println!("  {} ({} customers): {}", row.cohort, row.customers, cells.join("  "));
            }

            println!("\nMarketing performance");
            for channel in analytics.marketing().await? {
                println!(
                    "  {:<12} spend {:>10}  revenue {:>10}  ROAS {:.1}x  conversions {}",
                    channel.channel_name,
                    format_currency(channel.spend),
                    format_currency(channel.revenue),
                    channel.roas,
                    channel.conversions,
                );
            }
        }
        Command::Alerts { run, create } => {
            let alerts = AlertsService::new(gateway);

            if let Some(spec) = create {
                let rule = parse_rule_spec(&spec)?;
                let created = alerts.create(rule).await?;
                println!("Created rule #{} '{}'", created.id, created.name);
            }
            if run {
                alerts.run_now().await?;
                println!("Alert evaluation triggered.");
            }

            println!("Alert rules");
            for rule in alerts.rules().await? {
                println!(
                    "  #{} {:<20} {} {} {}  [{}]",
                    rule.id,
                    rule.name,
                    rule.metric,
                    rule.condition,
                    rule.threshold,
                    if rule.is_active { "active" } else { "paused" },
                );
            }

            println!("\nNotifications");
            for note in alerts.notifications().await? {
                let marker = if note.is_read { " " } else { "*" };
                println!("  {marker} {}", note.message);
            }
        }
        Command::Insights => {
            let insights = InsightService::new(gateway);

            println!("Recent insights");
            for insight in insights.feed().await? {
                println!("  [{}] {} - {}", insight.kind, insight.title, insight.content);
            }

            let comparison = insights.compare("This Month", "Last Month").await?;
            println!(
                "\nThis month vs last: revenue {} ({}), orders {} ({})",
                format_currency(comparison.current.total_revenue),
                comparison.delta.revenue_change,
                comparison.current.active_orders,
                comparison.delta.orders_change,
            );
        }
        Command::Views { action } => {
            let views = SavedViewsService::new(gateway, filters.clone());
            match action {
                ViewsAction::List => {
                    let all = views.list().await?;
                    if all.is_empty() {
                        println!("No saved views");
                    }
                    for view in all {
                        println!("  #{} {}", view.id, view.name);
                    }
                }
                ViewsAction::Save { name } => {
                    let view = views.save(&name).await?;
                    println!("Saved view #{} '{}'", view.id, view.name);
                }
                ViewsAction::Load { id } => {
                    let all = views.list().await?;
                    let view = all
                        .iter()
                        .find(|v| v.id == id)
                        .ok_or_else(|| anyhow::anyhow!("no saved view with id {id}"))?;
                    views.load(view)?;
                    println!("Loaded '{}': {:?}", view.name, filters.selection());
                }
                ViewsAction::Delete { id } => {
                    views.delete(id).await?;
                    println!("Deleted view #{id}");
                }
            }
        }
        Command::Upload { file } => {
            let bytes = std::fs::read(&file)?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload.csv".to_string());

            let profile = gateway.analyze_upload(&name, bytes).await?;
            if let Some((rows, cols)) = profile.shape {
                println!("{rows} rows x {cols} columns");
            }
            println!(
                "missing values: {}, duplicates: {}",
                profile.missing_values, profile.duplicates
            );
            if !profile.columns.is_empty() {
                println!("columns: {}", profile.columns.join(", "));
            }
            for recommendation in profile.recommendations {
                println!("hint: {recommendation}");
            }
        }
        Command::Ask { question } => {
            let insights = InsightService::new(gateway);
            let reply = insights.ask(&question).await?;
            println!("{}", reply.content);
        }
        Command::Login { token } => {
            session.set_token(&token)?;
            println!("Token stored.");
        }
        Command::Connect { provider } => {
            let integrations = IntegrationService::new(gateway, session.clone());
            integrations.connect(&provider).await?;
            println!("Connected {provider}.");
        }
        Command::Sync { provider } => {
            let integrations = IntegrationService::new(gateway, session.clone());
            let message = integrations.sync(&provider).await?;
            let status = integrations.status(&provider);
            println!("{message}");
            if let Some(synced_at) = status.synced_at {
                println!("Last synced: {synced_at}");
            }
        }
    }

    Ok(())
}

/// Parse "name:metric:condition:threshold" into a rule.
fn parse_rule_spec(spec: &str) -> anyhow::Result<NewAlertRule> {
    let parts: Vec<&str> = spec.split(':').collect();
    let [name, metric, condition, threshold] = parts.as_slice() else {
        anyhow::bail!("expected name:metric:condition:threshold, got '{spec}'");
    };
    Ok(NewAlertRule {
        name: name.to_string(),
        metric: metric.to_uppercase(),
        condition: condition.to_uppercase(),
        threshold: threshold
            .parse()
            .map_err(|_| anyhow::anyhow!("threshold '{threshold}' is not a number"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_spec() {
        let rule = parse_rule_spec("Revenue floor:revenue:lt:10000").unwrap();
        assert_eq!(rule.name, "Revenue floor");
        assert_eq!(rule.metric, "REVENUE");
        assert_eq!(rule.condition, "LT");
        assert_eq!(rule.threshold, 10_000.0);
    }

    #[test]
    fn test_parse_rule_spec_rejects_bad_shapes() {
        assert!(parse_rule_spec("only:three:parts").is_err());
        assert!(parse_rule_spec("a:b:c:not-a-number").is_err());
    }
}
