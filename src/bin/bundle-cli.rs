use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use bundle_analysis::{analyze_mint_bundles, AnalysisOptions, ToUi};
use bundle_inspector::{InspectorConfig, ReplayFixture};
use clap::{Parser, Subcommand};
use common_types::{AnalysisOutcome, MintBundleAnalysis, INSTANT_PURCHASE_VELOCITY};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "bundle-inspector.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch live history for a mint and look for same-slot bundles
    Inspect {
        mint: String,
        #[arg(long)]
        min_slot_transactions: Option<usize>,
        #[arg(long)]
        json: bool,
        /// Report token amounts in display units
        #[arg(long)]
        ui: bool,
    },
    /// Analyze a captured fixture file offline
    Replay {
        file: PathBuf,
        #[arg(long)]
        min_slot_transactions: Option<usize>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        ui: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed to analyze: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = InspectorConfig::load_with_env(&cli.config)?;

    match cli.command {
        Commands::Inspect { mint, min_slot_transactions, json, ui } => {
            let options = AnalysisOptions {
                min_slot_transactions: min_slot_transactions.unwrap_or(cfg.min_slot_transactions).max(1),
                thresholds: cfg.thresholds.clone(),
            };
            let mint_source = cfg.mint_source();
            let history_source = cfg.history_source()?;
            let result = analyze_mint_bundles(&mint, &mint_source, &history_source, &options, cfg.fetch_timeout()).await;
            let (analysis, info) = match result {
                Ok(ok) => ok,
                Err(e) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&AnalysisOutcome::failed(e.to_string()))?);
                    }
                    return Err(e.into());
                }
            };
            let analysis = if ui { analysis.to_ui(info.decimals) } else { analysis };
            print_analysis(&analysis, json)?;
        }
        Commands::Replay { file, min_slot_transactions, json, ui } => {
            let fixture = ReplayFixture::load(&file)?;
            let options = AnalysisOptions {
                min_slot_transactions: min_slot_transactions.unwrap_or(cfg.min_slot_transactions).max(1),
                thresholds: cfg.thresholds.clone(),
            };
            let analysis = fixture.analyze(&options);
            let analysis = if ui { analysis.to_ui(fixture.decimals) } else { analysis };
            print_analysis(&analysis, json)?;
        }
    }
    Ok(())
}

fn print_analysis(analysis: &MintBundleAnalysis, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&AnalysisOutcome::ok(analysis.clone()))?);
        return Ok(());
    }
    println!("Mint: {}", analysis.mint_address);
    println!("Supply: {}", analysis.total_supply);
    if analysis.total_bundles == 0 {
        println!("No bundles found");
        return Ok(());
    }
    println!(
        "Bundles: {}  SOL spent: {:.4}  Signatures: {}",
        analysis.total_bundles, analysis.total_sol_spent, analysis.total_unique_wallets
    );
    for b in &analysis.bundles {
        let velocity = if b.purchase_velocity == INSTANT_PURCHASE_VELOCITY {
            "instant".to_string()
        } else {
            format!("{:.2}/h", b.purchase_velocity)
        };
        println!(
            "  slot {:>12}  txs {:>3}  supply {:>7.3}%  sol {:>10.4}  avg {:.3e}  velocity {}  [{}]",
            b.slot,
            b.transactions.len(),
            b.supply_percentage,
            b.sol_spent,
            b.avg_price_per_token,
            velocity,
            b.bundle_address
        );
    }
    let p = &analysis.suspicious_patterns;
    println!("Rapid accumulation: {}", p.rapid_accumulation.len());
    println!("Price manipulation: {}", p.price_manipulation.len());
    println!("Coordinated buying: {}", p.coordinated_buying.len());
    Ok(())
}
