//! Folio CLI - portfolio metrics and allocation optimization.
//!
//! Every command prints a JSON `ApiResponse` envelope on stdout. Logs go to
//! stderr and are filtered with `RUST_LOG`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use folio_core::{
    snapshot::{load_holdings, load_series},
    AnalyticsConfig, ApiResponse, MetricsEngine, Objective, OptimizationEngine, RiskAssessment,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio portfolio analytics - metrics, risk and optimization")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.folio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the annual risk-free rate (0.02 = 2%)
    #[arg(long, global = true)]
    risk_free_rate: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate portfolio metrics
    Metrics {
        /// Holdings snapshot (JSON array)
        #[arg(long)]
        holdings: PathBuf,
        /// Historical portfolio values (JSON array)
        #[arg(long)]
        history: Option<PathBuf>,
        /// Benchmark returns (JSON array)
        #[arg(long)]
        market: Option<PathBuf>,
    },
    /// Optimize allocation weights
    Optimize {
        /// Holdings snapshot (JSON array)
        #[arg(long)]
        holdings: PathBuf,
        /// Optimization objective
        #[arg(long, value_enum, default_value = "max-sharpe")]
        objective: ObjectiveArg,
    },
    /// Generate the efficient frontier
    Frontier {
        /// Holdings snapshot (JSON array)
        #[arg(long)]
        holdings: PathBuf,
        /// Number of frontier points (defaults to config)
        #[arg(long)]
        points: Option<usize>,
    },
    /// Rate portfolio risk and list recommendations
    Assess {
        /// Holdings snapshot (JSON array)
        #[arg(long)]
        holdings: PathBuf,
        /// Historical portfolio values (JSON array)
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    MaxSharpe,
    MinVolatility,
    MaxReturn,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::MaxSharpe => Objective::MaxSharpe,
            ObjectiveArg::MinVolatility => Objective::MinVolatility,
            ObjectiveArg::MaxReturn => Objective::MaxReturn,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let response = match run(&cli) {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ApiResponse::err(e.to_string())
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run(cli: &Cli) -> folio_core::Result<Value> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Metrics {
            holdings,
            history,
            market,
        } => handle_metrics(&config, holdings, history.as_deref(), market.as_deref()),
        Commands::Optimize {
            holdings,
            objective,
        } => handle_optimize(&config, holdings, (*objective).into()),
        Commands::Frontier { holdings, points } => handle_frontier(&config, holdings, *points),
        Commands::Assess { holdings, history } => {
            handle_assess(&config, holdings, history.as_deref())
        }
        Commands::Config => Ok(json!({
            "path": config_path(cli).display().to_string(),
            "config": config,
        })),
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(AnalyticsConfig::default_path)
}

fn load_config(cli: &Cli) -> folio_core::Result<AnalyticsConfig> {
    let mut config = AnalyticsConfig::load_from_path(&config_path(cli))?;
    if let Some(rate) = cli.risk_free_rate {
        config.risk_free_rate = rate;
        config.validate()?;
    }
    Ok(config)
}

fn load_optional_series(path: Option<&Path>) -> folio_core::Result<Option<Vec<f64>>> {
    path.map(load_series).transpose()
}

fn handle_metrics(
    config: &AnalyticsConfig,
    holdings: &Path,
    history: Option<&Path>,
    market: Option<&Path>,
) -> folio_core::Result<Value> {
    let holdings = load_holdings(holdings)?;
    let history = load_optional_series(history)?;
    let market = load_optional_series(market)?;

    let engine = MetricsEngine::with_config(config);
    let metrics =
        engine.calculate_portfolio_metrics(&holdings, history.as_deref(), market.as_deref());

    Ok(json!({ "metrics": metrics }))
}

fn handle_optimize(
    config: &AnalyticsConfig,
    holdings: &Path,
    objective: Objective,
) -> folio_core::Result<Value> {
    let holdings = load_holdings(holdings)?;

    let engine = OptimizationEngine::with_config(config);
    let result = engine.optimize(&holdings, objective)?;
    let equal_weight = engine.equal_weight_portfolio(&holdings)?;

    Ok(json!({
        "result": result,
        "equal_weight": equal_weight,
    }))
}

fn handle_frontier(
    config: &AnalyticsConfig,
    holdings: &Path,
    points: Option<usize>,
) -> folio_core::Result<Value> {
    let holdings = load_holdings(holdings)?;

    let engine = OptimizationEngine::with_config(config);
    let frontier = match points {
        Some(points) => engine.generate_efficient_frontier(&holdings, points)?,
        None => engine.efficient_frontier(&holdings)?,
    };
    let tangency = engine.optimize(&holdings, Objective::MaxSharpe)?.portfolio_point();
    let cal = engine.capital_allocation_line(&tangency, folio_core::optimize::CAL_STEPS);

    Ok(json!({
        "frontier": frontier,
        "tangency": tangency,
        "capital_allocation_line": cal,
    }))
}

fn handle_assess(
    config: &AnalyticsConfig,
    holdings: &Path,
    history: Option<&Path>,
) -> folio_core::Result<Value> {
    let holdings = load_holdings(holdings)?;
    let history = load_optional_series(history)?;

    let engine = MetricsEngine::with_config(config);
    let metrics = engine.calculate_portfolio_metrics(&holdings, history.as_deref(), None);
    let assessment = RiskAssessment::from_metrics(&metrics, &holdings);

    Ok(json!({
        "metrics": metrics,
        "assessment": assessment,
    }))
}
