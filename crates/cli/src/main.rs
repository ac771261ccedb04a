use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use techscan_agent::prompt::{format_metric, format_value};
use techscan_agent::{
    AgentReport, AppConfig, Findings, OpenAiResponses, ReasoningService, TechnicalAgent, Team,
    ValuationAgent,
};
use techscan_core::{BarSource, Fundamentals, IndicatorSnapshot, Lookback};
use techscan_data::{CsvBarSource, JsonFundamentalsSource};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "techscan")]
#[command(about = "Compute technical indicators and fundamentals, and ask a reasoning model for a read")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file with [indicators] and [agent] sections
    #[arg(short, long, env = "TECHSCAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Ticker symbols (e.g. AAPL MSFT)
    #[arg(required = true)]
    tickers: Vec<String>,

    /// Directory holding <TICKER>.csv daily bars and <TICKER>.json fundamentals
    #[arg(short, long, env = "TECHSCAN_DATA_DIR", default_value = "data")]
    data: PathBuf,

    /// Lookback period (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)
    #[arg(short, long)]
    period: Option<Lookback>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Technical,
    Valuation,
}

#[derive(Args)]
struct TeamArgs {
    /// Agents to run (repeatable); all of them when omitted
    #[arg(short, long = "agent", value_enum)]
    agents: Vec<AgentKind>,
}

impl TeamArgs {
    fn selected(&self) -> Vec<AgentKind> {
        AgentKind::value_variants()
            .iter()
            .copied()
            .filter(|kind| self.agents.is_empty() || self.agents.contains(kind))
            .collect()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the latest indicator values
    Indicators(AnalysisArgs),

    /// Print the company fundamentals
    Fundamentals(AnalysisArgs),

    /// Print the analyst prompts
    Prompt {
        #[command(flatten)]
        args: AnalysisArgs,

        #[command(flatten)]
        team: TeamArgs,
    },

    /// Send the prompts to the reasoning service and print the answers
    Analyze {
        #[command(flatten)]
        args: AnalysisArgs,

        #[command(flatten)]
        team: TeamArgs,

        /// OpenAI API key
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Model name
        #[arg(long, env = "OPENAI_MODEL")]
        model: Option<String>,
    },

    /// List tickers available in the data directory
    Tickers {
        #[arg(short, long, env = "TECHSCAN_DATA_DIR", default_value = "data")]
        data: PathBuf,
    },

    /// Print the default configuration as TOML
    Defaults,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    tracing::debug!(
        period = %config.agent.period,
        model = %config.agent.model,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Indicators(args) => {
            let team = build_team(&args, &[AgentKind::Technical], &mut config, None)?;
            run_team(&team, &args, Output::Data).await
        }
        Commands::Fundamentals(args) => {
            let team = build_team(&args, &[AgentKind::Valuation], &mut config, None)?;
            run_team(&team, &args, Output::Data).await
        }
        Commands::Prompt { args, team } => {
            let team = build_team(&args, &team.selected(), &mut config, None)?;
            run_team(&team, &args, Output::Prompt).await
        }
        Commands::Analyze {
            args,
            team,
            api_key,
            model,
        } => {
            if let Some(model) = model {
                config.agent.model = model;
            }
            let service: Arc<dyn ReasoningService> =
                Arc::new(OpenAiResponses::new(api_key, &config.agent)?);
            let team = build_team(&args, &team.selected(), &mut config, Some(service))?;
            run_team(&team, &args, Output::Answer).await
        }
        Commands::Tickers { data } => {
            let source = CsvBarSource::new(data);
            for ticker in source.available_tickers().await? {
                println!("{ticker}");
            }
            Ok(())
        }
        Commands::Defaults => {
            print!("{}", AppConfig::default().to_toml()?);
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
enum Output {
    /// The findings only: indicator values or fundamentals.
    Data,
    Prompt,
    Answer,
}

fn build_team(
    args: &AnalysisArgs,
    kinds: &[AgentKind],
    config: &mut AppConfig,
    reasoning: Option<Arc<dyn ReasoningService>>,
) -> Result<Team> {
    if let Some(period) = args.period {
        config.agent.period = period;
    }
    config.indicators.validate()?;

    let mut team = Team::new();
    for kind in kinds {
        team = match kind {
            AgentKind::Technical => {
                let source: Arc<dyn BarSource> = Arc::new(CsvBarSource::new(&args.data));
                let mut agent = TechnicalAgent::new(source, config.indicators)
                    .with_period(config.agent.period);
                if let Some(service) = &reasoning {
                    agent = agent.with_reasoning(Arc::clone(service));
                }
                team.with_agent(Box::new(agent))
            }
            AgentKind::Valuation => {
                let mut agent =
                    ValuationAgent::new(Arc::new(JsonFundamentalsSource::new(&args.data)));
                if let Some(service) = &reasoning {
                    agent = agent.with_reasoning(Arc::clone(service));
                }
                team.with_agent(Box::new(agent))
            }
        };
    }
    Ok(team)
}

/// Run the team over every ticker. Failed runs are reported and skipped;
/// the exit status is an error only if every run failed.
async fn run_team(team: &Team, args: &AnalysisArgs, output: Output) -> Result<()> {
    let mut failures = 0usize;
    for ticker in &args.tickers {
        let mut reports = Vec::with_capacity(team.len());
        for (agent, result) in team.run(ticker).await {
            match result {
                Ok(report) => {
                    print_report(&report, output, args.json)?;
                    reports.push(report);
                }
                Err(e) => {
                    failures += 1;
                    eprintln!("{agent} failed for {ticker}: {e}");
                }
            }
        }
        if matches!(output, Output::Answer) && !args.json && !reports.is_empty() {
            print_summary(ticker, &reports);
        }
    }

    if failures > 0 && failures == args.tickers.len() * team.len() {
        anyhow::bail!("No ticker could be analyzed");
    }
    Ok(())
}

fn print_report(report: &AgentReport, output: Output, json: bool) -> Result<()> {
    if json {
        let value = match output {
            Output::Data => serde_json::json!({
                "agent": report.agent,
                "ticker": report.ticker,
                "findings": report.findings,
            }),
            Output::Prompt | Output::Answer => serde_json::to_value(report)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match output {
        Output::Data => match &report.findings {
            Findings::Indicators { period, snapshot } => {
                print_indicators(&report.ticker, *period, snapshot)
            }
            Findings::Fundamentals(f) => print_fundamentals(f),
        },
        Output::Prompt => println!("{}\n", report.prompt),
        Output::Answer => {
            println!("--- {} ({}) ---", report.agent, report.ticker);
            println!("{}", report.answer.as_deref().unwrap_or_default());
            if let Some(rec) = &report.recommendation {
                println!("\nVerdict: {rec}");
            }
            println!();
        }
    }
    Ok(())
}

fn print_indicators(ticker: &str, period: Lookback, s: &IndicatorSnapshot) {
    let sep = "=".repeat(48);
    println!("{sep}");
    println!("  {} ({}) as of {}", ticker, period, s.date);
    println!("{sep}");
    println!("  Close:           {}", format_value(s.close));
    println!("  SMA short:       {}", format_value(s.sma_short));
    println!("  SMA long:        {}", format_value(s.sma_long));
    println!("  RSI:             {}", format_value(s.rsi));
    println!("  MACD:            {}", format_value(s.macd));
    println!("  MACD signal:     {}", format_value(s.macd_signal));
    println!("  Bollinger upper: {}", format_value(s.bollinger_upper));
    println!("  Bollinger lower: {}", format_value(s.bollinger_lower));
    println!("  Stochastic %K:   {}", format_value(s.stoch_k));
    println!("  Stochastic %D:   {}", format_value(s.stoch_d));
    println!("{sep}\n");
}

fn print_fundamentals(f: &Fundamentals) {
    let sep = "=".repeat(48);
    println!("{sep}");
    println!("  {} ({})", f.ticker, f.short_name);
    if !f.sector.is_empty() || !f.industry.is_empty() {
        println!("  {} / {}", f.sector, f.industry);
    }
    println!("{sep}");
    for (label, value) in f.metrics() {
        println!("  {:<20} {}", format!("{label}:"), format_metric(value));
    }
    println!("{sep}\n");
}

fn print_summary(ticker: &str, reports: &[AgentReport]) {
    println!("=== Team Summary: {ticker} ===");
    for report in reports {
        println!(
            "  {:<16} {}",
            report.agent,
            report.recommendation.as_deref().unwrap_or("no verdict")
        );
    }
    println!();
}
