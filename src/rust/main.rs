// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! hybrid-prover CLI - Main binary entry point
//!
//! Analyses formulas and proves them through the router, the hybrid prover
//! or the multi-prover verifier

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hybrid_prover::provers::{CachedProver, ProverFactory};
use hybrid_prover::{
    parse_formula, CoreConfig, Formula, FormulaAnalyzer, HybridContext, HybridStrategy,
    NeuralSymbolicHybridProver, ProofCache, ProverAdapter, ProverIntegrationAdapter, ProverKind,
    ProverRouter, RoutingStrategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

mod output;

use output::{OutputFormat, OutputFormatter, ProverListing};

/// hybrid-prover - route formulas to theorem provers and combine their verdicts
#[derive(Parser)]
#[command(name = "hybrid-prover")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a formula and recommend provers
    Analyze {
        /// Formula text, e.g. "forall x. P(x) -> Q(x)"
        formula: String,
    },

    /// Prove a formula through the prover router
    Prove {
        formula: String,

        /// Routing strategy (auto, fastest, most_capable, parallel, sequential)
        #[arg(short, long)]
        strategy: Option<RoutingStrategy>,

        /// Order provers by formula analysis instead of a fixed strategy
        #[arg(long, conflicts_with = "strategy")]
        analyze: bool,

        /// Axiom assumed true (repeatable)
        #[arg(short, long = "axiom")]
        axioms: Vec<String>,

        /// Timeout in seconds per prover
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Prove a formula with the neural-symbolic hybrid prover
    Hybrid {
        formula: String,

        /// Hybrid strategy (neural_first, symbolic_first, parallel, ensemble, adaptive)
        #[arg(short, long)]
        strategy: Option<HybridStrategy>,

        /// Axiom assumed true (repeatable)
        #[arg(short, long = "axiom")]
        axioms: Vec<String>,

        /// Timeout in seconds per prover
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Verify statements with every configured prover and vote
    Verify {
        #[arg(required = true)]
        statements: Vec<String>,

        /// Timeout in seconds per prover
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List provers and whether their backends are available
    Provers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let formatter = OutputFormatter::new(cli.format);

    if let Err(e) = run(cli, &formatter).await {
        formatter.error(&format!("{:#}", e))?;
        std::process::exit(2);
    }
    Ok(())
}

async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CoreConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => CoreConfig::default(),
    };
    let show_progress = cli.format == OutputFormat::Text;

    match cli.command {
        Commands::Analyze { formula } => analyze_command(&formula, formatter),

        Commands::Prove {
            formula,
            strategy,
            analyze,
            axioms,
            timeout,
        } => {
            let proved = prove_command(
                &config,
                &formula,
                strategy,
                analyze,
                &axioms,
                timeout,
                show_progress,
                formatter,
            )
            .await?;
            exit_unless(proved);
            Ok(())
        }

        Commands::Hybrid {
            formula,
            strategy,
            axioms,
            timeout,
        } => {
            let valid = hybrid_command(
                config,
                &formula,
                strategy,
                &axioms,
                timeout,
                show_progress,
                formatter,
            )
            .await?;
            exit_unless(valid);
            Ok(())
        }

        Commands::Verify {
            statements,
            timeout,
        } => {
            let all_valid =
                verify_command(config, &statements, timeout, show_progress, formatter).await?;
            exit_unless(all_valid);
            Ok(())
        }

        Commands::Provers => provers_command(&config, formatter),
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::{fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("hybrid_prover=debug,info")
    } else {
        EnvFilter::new("hybrid_prover=info,warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn exit_unless(success: bool) {
    if !success {
        std::process::exit(1);
    }
}

fn parse(text: &str) -> Result<Formula> {
    parse_formula(text).with_context(|| format!("Failed to parse formula: {}", text))
}

fn parse_all(texts: &[String]) -> Result<Vec<Formula>> {
    texts.iter().map(|t| parse(t)).collect()
}

/// Detect backends and wrap each with the shared proof cache
fn detect_adapters(
    config: &CoreConfig,
    cache: &Arc<dyn ProofCache>,
) -> Result<Vec<Arc<dyn ProverAdapter>>> {
    let detected = ProverFactory::detect_all(config.neural.as_ref())
        .context("Failed to initialise prover backends")?;
    debug!("Detected {} prover backend(s)", detected.len());
    Ok(detected
        .into_iter()
        .map(|adapter| {
            Arc::new(CachedProver::new(adapter, Arc::clone(cache))) as Arc<dyn ProverAdapter>
        })
        .collect())
}

/// Analyze command implementation
fn analyze_command(text: &str, formatter: &OutputFormatter) -> Result<()> {
    let formula = parse(text)?;
    let analysis = FormulaAnalyzer::new().analyze(&formula)?;
    formatter.output_analysis(text, &analysis)
}

/// Prove command implementation
#[allow(clippy::too_many_arguments)]
async fn prove_command(
    config: &CoreConfig,
    text: &str,
    strategy: Option<RoutingStrategy>,
    analyze: bool,
    axioms: &[String],
    timeout: Option<u64>,
    show_progress: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let formula = parse(text)?;
    let axioms = parse_all(axioms)?;
    let cache: Arc<dyn ProofCache> = config.cache.build();

    let mut router = ProverRouter::new(config.router.clone());
    for adapter in detect_adapters(config, &cache)? {
        router.register(adapter);
    }
    info!("Router provers: {:?}", router.available_provers());

    let strategy = strategy.unwrap_or(config.router.default_strategy);
    let timeout = timeout.map(Duration::from_secs);

    let pb = create_progress_bar(show_progress, "Proving...");
    let result = if analyze {
        router.prove_with_analysis(&formula, &axioms, timeout).await
    } else {
        router.prove(&formula, &axioms, strategy, timeout).await
    };
    pb.finish_and_clear();

    let result = result.context("Routing failed")?;
    formatter.output_router_result(&result)?;
    Ok(result.is_proved)
}

/// Hybrid command implementation
async fn hybrid_command(
    mut config: CoreConfig,
    text: &str,
    strategy: Option<HybridStrategy>,
    axioms: &[String],
    timeout: Option<u64>,
    show_progress: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let formula = parse(text)?;
    let context = HybridContext {
        axioms: parse_all(axioms)?,
        ..HybridContext::default()
    };
    if let Some(strategy) = strategy {
        config.hybrid.strategy = strategy;
    }

    let cache: Arc<dyn ProofCache> = config.cache.build();
    let adapters = detect_adapters(&config, &cache)?;
    let prover = NeuralSymbolicHybridProver::new(config.hybrid.clone(), &adapters)?;

    let pb = create_progress_bar(show_progress, "Proving...");
    let result = prover
        .prove(&formula, Some(&context), timeout.map(Duration::from_secs))
        .await;
    pb.finish_and_clear();

    formatter.output_hybrid_result(&result)?;
    Ok(result.is_valid)
}

/// Verify command implementation
async fn verify_command(
    config: CoreConfig,
    texts: &[String],
    timeout: Option<u64>,
    show_progress: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let statements = parse_all(texts)?;
    let cache: Arc<dyn ProofCache> = config.cache.build();
    let adapters = detect_adapters(&config, &cache)?;
    let adapter =
        ProverIntegrationAdapter::new(config.integration.clone(), &adapters, Some(cache));

    let pb = create_progress_bar(show_progress, "Verifying...");
    let results = adapter
        .verify_statements(&statements, timeout.map(Duration::from_secs))
        .await;
    pb.finish_and_clear();

    for result in &results {
        formatter.output_aggregate(result)?;
    }
    Ok(results.iter().all(|r| r.overall_valid))
}

/// List provers command
fn provers_command(config: &CoreConfig, formatter: &OutputFormatter) -> Result<()> {
    let mut listings = Vec::new();
    for kind in ProverKind::profiled() {
        let enabled = config.router.allows(kind);
        let available = enabled && ProverFactory::detect(kind, config.neural.as_ref())?.is_some();
        listings.push(ProverListing {
            name: kind.to_string(),
            available,
        });
    }
    formatter.output_provers(&listings)
}

/// Create a spinner; hidden unless `visible`
fn create_progress_bar(visible: bool, message: &str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
