use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use cohort_core::config::{base_url_from_env_value, request_timeout_from_env_value};
use cohort_core::constants::{API_TIMEOUT_ENV, API_URL_ENV};
use cohort_core::{
    ChartSelection, ClientConfig, CohortApi, CohortBrowser, CohortCache, CohortId, FilterForm,
    HttpCohortApi, Notice, Prompter, ResultPanel, Section, SelectionMode,
};
use registry::FieldKind;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Hip fracture registry cohort builder")]
struct Cli {
    /// Backend base URL (falls back to COHORT_API_URL, then http://localhost:5050)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Request timeout in seconds (falls back to COHORT_API_TIMEOUT_SECS; 0 waits forever)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List filter fields and their options
    Fields {
        /// Only show one section (1-10)
        #[arg(long)]
        section: Option<u8>,
    },
    /// Count the patients matching a set of filters
    Build {
        /// Filter as key=value, e.g. -f minAge=80 -f sex=Female
        #[arg(short = 'f', long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Allow several options per field
        #[arg(long)]
        multi: bool,
    },
    /// Count a cohort and save it under a name
    Save {
        /// Cohort name
        name: String,
        /// Filter as key=value
        #[arg(short = 'f', long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Allow several options per field
        #[arg(long)]
        multi: bool,
    },
    /// List saved cohorts
    List,
    /// Delete a saved cohort
    Delete {
        /// Cohort id
        id: CohortId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Analyse a saved cohort
    Analyse {
        /// Cohort id
        id: CohortId,
        /// Chart to show: all, mortality, walking, fracture, residence, transition,
        /// timelines or surgery
        #[arg(long, default_value = "all")]
        chart: ChartSelection,
        /// Write the shown charts as image files into this directory
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also print each chart's data URI
        #[arg(long)]
        uris: bool,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

/// Writes `message` and reads a yes/no answer. Any I/O failure counts as "no".
fn ask(message: &str, out: &mut impl Write, input: &mut impl BufRead) -> bool {
    if write!(out, "{message} [y/N] ").is_err() || out.flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Terminal prompts. Notices go to stdout, failures to stderr.
struct TerminalPrompter {
    assume_yes: bool,
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            ask(&message, &mut std::io::stdout(), &mut std::io::stdin().lock())
        })
        .await
        .unwrap_or(false)
    }

    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Saved { .. } => println!("{notice}"),
            _ => eprintln!("{notice}"),
        }
    }
}

fn client_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let base_url = base_url_from_env_value(
        cli.api_url
            .clone()
            .or_else(|| std::env::var(API_URL_ENV).ok()),
    );
    let timeout = match cli.timeout_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => request_timeout_from_env_value(std::env::var(API_TIMEOUT_ENV).ok())?,
    };
    ClientConfig::new(&base_url, timeout).context("invalid backend configuration")
}

fn print_fields(only: Option<u8>) {
    for section in Section::ALL {
        if only.is_some_and(|n| n != section.number()) {
            continue;
        }
        println!("{section}");
        for field in section.fields() {
            match field.kind() {
                FieldKind::Range => {
                    println!("  minAge / maxAge   {} (years)", field.label());
                }
                FieldKind::Choice => {
                    println!("  {:<17} {}", field.wire_name(), field.label());
                    for option in field.options() {
                        println!("      {:<10} {}", option.value, option.label);
                    }
                }
            }
        }
    }
}

async fn build_form(
    api: Arc<dyn CohortApi>,
    prompter: Arc<dyn Prompter>,
    filters: &[(String, String)],
    multi: bool,
) -> anyhow::Result<FilterForm> {
    let mode = if multi {
        SelectionMode::Multi
    } else {
        SelectionMode::Single
    };
    let mut form = FilterForm::new(api, prompter, mode);
    for (key, value) in filters {
        form.apply(key, value)
            .with_context(|| format!("invalid filter {key}={value}"))?;
    }

    form.submit().await;
    match form.result_panel() {
        ResultPanel::Count(count) => {
            println!(
                "{count} patients in cohort ({} filters applied)",
                cohort_core::active_filter_count(form.filters())
            );
        }
        ResultPanel::Error(error) => anyhow::bail!("Error: {error}"),
        ResultPanel::Building | ResultPanel::Placeholder => {
            anyhow::bail!("no count returned")
        }
    }
    Ok(form)
}

async fn list_cohorts(api: &dyn CohortApi) -> anyhow::Result<()> {
    let mut cache = CohortCache::new();
    cache.refresh(api).await.context("failed to load cohorts")?;

    if cache.is_empty() {
        println!("No saved cohorts yet. Build and save a cohort to see it here.");
        return Ok(());
    }
    for cohort in cache.cohorts() {
        let created = cohort
            .created_at_utc()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .or_else(|| cohort.created_at.as_ref().map(|raw| raw.to_string()))
            .unwrap_or_else(|| "-".into());
        println!(
            "ID: {}, Name: {}, Patients: {}, Filters: {}, Created: {}",
            cohort.id,
            cohort.name,
            cohort.count,
            cohort.active_filter_count(),
            created
        );
    }
    Ok(())
}

async fn analyse_cohort(
    browser: &mut CohortBrowser,
    id: &CohortId,
    chart: ChartSelection,
    out: Option<PathBuf>,
    print_uris: bool,
) -> anyhow::Result<()> {
    browser.refresh().await.context("failed to load cohorts")?;
    browser.analyse(id).await?;
    browser.select_chart(chart);

    if let Some(summary) = browser.selected_summary() {
        println!("{}", summary.name);
        println!(
            "  Patients: {}, Filters applied: {}",
            summary.patients, summary.filters_applied
        );
    }

    let Some(analysis) = browser.analysis() else {
        return Ok(());
    };

    if let Some(metrics) = &analysis.metrics {
        if let Some(n) = metrics.n_hospitals {
            println!("  Hospitals: {n}");
        }
        if let Some(range) = &metrics.date_range {
            println!("  Date range: {range}");
        }
        if let Some(rate) = metrics.imputation_rate {
            println!("  Imputation rate: {rate:.1}%");
        }
        for (field, stat) in metrics.imputation_ranked() {
            println!("    {field}: {} ({:.1}%)", stat.count, stat.percent);
        }
    }
    if let Some(mortality) = &analysis.mortality {
        for (label, rate) in mortality.timeframes() {
            println!("  {label} mortality: {} ({:.1}%)", rate.count, rate.rate);
        }
    }

    println!("{}:", chart.label());
    let visible = browser.visible_charts();
    if visible.is_empty() {
        println!("  no charts available");
    }
    for (kind, image) in &visible {
        println!("  {} ({})", kind.title(), kind.id());
        if print_uris {
            println!("    {}", image.as_uri());
        }
    }

    if let Some(dir) = out {
        for path in analysis.export(&dir, chart)? {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cohort_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command.as_ref() else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Fields { section } = command {
        print_fields(*section);
        return Ok(());
    }

    let cfg = client_config(&cli)?;
    let http = HttpCohortApi::new(&cfg)?;
    tracing::debug!("using backend {}", http.base_url());
    let api: Arc<dyn CohortApi> = Arc::new(http);
    let assume_yes = matches!(command, Commands::Delete { yes: true, .. });
    let prompter: Arc<dyn Prompter> = Arc::new(TerminalPrompter { assume_yes });

    match command {
        Commands::Fields { .. } => {}
        Commands::Build { filters, multi } => {
            build_form(api, prompter, filters, *multi).await?;
        }
        Commands::Save {
            name,
            filters,
            multi,
        } => {
            let mut form = build_form(api, prompter, filters, *multi).await?;
            form.open_save_dialog();
            form.set_cohort_name(name.as_str());
            form.save().await?;
        }
        Commands::List => list_cohorts(api.as_ref()).await?,
        Commands::Delete { id, .. } => {
            let mut browser = CohortBrowser::new(api, prompter);
            browser.refresh().await.context("failed to load cohorts")?;
            if browser.remove(id).await? {
                println!("Deleted cohort {id}");
            } else {
                println!("Cancelled");
            }
        }
        Commands::Analyse {
            id,
            chart,
            out,
            uris,
        } => {
            let mut browser = CohortBrowser::new(api, prompter);
            analyse_cohort(&mut browser, id, *chart, out.clone(), *uris).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_argument_parsing() {
        assert_eq!(
            parse_filter("minAge=80").unwrap(),
            ("minAge".to_string(), "80".to_string())
        );
        assert_eq!(
            parse_filter("sex = Female").unwrap(),
            ("sex".to_string(), "Female".to_string())
        );
        assert_eq!(
            parse_filter("age=65-90").unwrap(),
            ("age".to_string(), "65-90".to_string())
        );
        assert!(parse_filter("sex").is_err());
        assert!(parse_filter("=Female").is_err());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn confirmation_answers() {
        let mut out = Vec::new();
        assert!(ask("Delete?", &mut out, &mut "yes\n".as_bytes()));
        assert_eq!(out, b"Delete? [y/N] ");

        assert!(ask("Delete?", &mut Vec::new(), &mut " Y \n".as_bytes()));
        assert!(!ask("Delete?", &mut Vec::new(), &mut "\n".as_bytes()));
        assert!(!ask("Delete?", &mut Vec::new(), &mut "nope\n".as_bytes()));
    }

    #[test]
    fn failed_flush_declines() {
        assert!(!ask("Delete?", &mut BrokenPipe, &mut "y\n".as_bytes()));
    }

    #[test]
    fn cli_parses_analyse_options() {
        let cli = Cli::try_parse_from([
            "cohort",
            "--api-url",
            "http://10.0.0.4:5050",
            "analyse",
            "7",
            "--chart",
            "surgery",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://10.0.0.4:5050"));
        match cli.command {
            Some(Commands::Analyse {
                id,
                chart,
                out,
                uris,
            }) => {
                assert_eq!(id.as_str(), "7");
                assert_eq!(
                    chart,
                    ChartSelection::Only(cohort_core::ChartKind::Surgery)
                );
                assert!(out.is_none());
                assert!(!uris);
            }
            _ => panic!("expected analyse command"),
        }
    }

    #[test]
    fn explicit_flags_override_environment() {
        let cli = Cli::try_parse_from([
            "cohort",
            "list",
            "--api-url",
            "http://backend:9000",
            "--timeout-secs",
            "5",
        ])
        .unwrap();

        let cfg = client_config(&cli).unwrap();
        assert_eq!(cfg.base_url().as_str(), "http://backend:9000/");
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(5)));
    }
}
