use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use estimate_cli::app::{
    self, LaborArgs, MiscEquipmentArgs, ProjectArgs, ReviewArgs, SummaryArgs, WireConduitArgs,
};
use estimate_cli::config::{AppConfig, CliOverrides};
use estimate_cli::logging;
use estimate_core::calculations::PricingCalculator;
use estimate_core::workflow::EstimateWorkflow;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// EV charger installation cost estimator.
///
/// Walks a project through the wire & conduit, misc & equipment, and labor
/// stages, then prices the summary.
#[derive(Debug, Parser)]
#[command(name = "estimator", version)]
struct Cli {
    /// Config file. Defaults to `estimator.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend (`sqlite` or `http`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Connection string.
    /// For SQLite a file path or `:memory:`; for HTTP the base URL.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or filter directive.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a project.
    NewProject(ProjectArgs),

    /// Submit the wire & conduit stage from a CSV file.
    WireConduit(WireConduitArgs),

    /// Submit the misc & equipment stage from a CSV file.
    MiscEquipment(MiscEquipmentArgs),

    /// Submit the labor stage from a CSV file.
    Labor(LaborArgs),

    /// Price the summary, optionally saving it.
    Summary {
        #[command(flatten)]
        args: SummaryArgs,

        /// Store the summary and complete the project.
        #[arg(long)]
        save: bool,
    },

    /// Print the recomputed summary as JSON.
    Show(SummaryArgs),

    /// List every project, most recent start date first.
    Projects,

    /// Print everything stored for one project.
    Review(ReviewArgs),
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            backend: self.backend.clone(),
            connection: self.db.clone(),
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.apply_overrides(&cli.overrides());
    logging::init_logging(&config.logging)?;

    debug!(backend = %config.database.backend, "opening repository");
    let registry = app::build_registry();
    let repo = registry
        .create(&config.database)
        .await
        .with_context(|| format!("cannot open '{}' backend", config.database.backend))?;

    let workflow = EstimateWorkflow::new(
        repo.as_ref(),
        PricingCalculator::new(config.pricing.clone()),
    );

    let output = match &cli.command {
        Command::NewProject(args) => app::new_project(&workflow, args).await?,
        Command::WireConduit(args) => app::wire_conduit(&workflow, args).await?,
        Command::MiscEquipment(args) => app::misc_equipment(&workflow, args).await?,
        Command::Labor(args) => app::labor(&workflow, args).await?,
        Command::Summary { args, save } => app::summary(&workflow, args, *save).await?,
        Command::Show(args) => app::show(&workflow, args).await?,
        Command::Projects => app::projects(&workflow).await?,
        Command::Review(args) => app::review(&workflow, args).await?,
    };
    println!("{output}");

    Ok(())
}
