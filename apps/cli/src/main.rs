//! # quotewise: Cart Pricing CLI
//!
//! Reads a cart document, prices it with `quotewise-core`, and prints the
//! result as JSON.
//!
//! ## Commands
//! - `quotewise price [FILE]` - price a cart (stdin when FILE is absent or `-`)
//! - `quotewise check-config` - print the effective configuration
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         quotewise startup                               │
//! │                                                                         │
//! │  1. Initialize tracing (stderr, RUST_LOG)                              │
//! │  2. Parse flags                                                        │
//! │  3. Load PricingConfig (defaults → pricing.toml → env → flags)         │
//! │  4. Run the command, JSON on stdout                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod document;
mod error;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use quotewise_core::RoundingMode;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{CliOverrides, PricingConfig};
use document::{price_document, CartDocument};

/// Prices carts: quantity discounts, per-component taxes and totals
#[derive(Parser)]
#[command(name = "quotewise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file path (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a cart document
    Price(PriceArgs),

    /// Print the effective configuration as TOML
    CheckConfig(ContextArgs),
}

#[derive(Args)]
struct PriceArgs {
    /// Cart document (JSON); reads stdin when absent or "-"
    file: Option<PathBuf>,

    /// Cart-level volume discount percentage
    #[arg(long, value_name = "PCT")]
    volume_discount: Option<Decimal>,

    #[command(flatten)]
    context: ContextArgs,
}

/// Flags that override the configured pricing context.
#[derive(Args)]
struct ContextArgs {
    /// Use the inter-state rule set
    #[arg(long, conflicts_with = "intra")]
    inter: bool,

    /// Use the intra-state rule set
    #[arg(long)]
    intra: bool,

    /// Decimal places for rounded figures
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    precision: Option<i32>,

    /// Treat the cart as tax exempt
    #[arg(long)]
    exempt: bool,

    /// Rounding strategy: half_away_from_zero, half_even or truncate
    #[arg(long, value_name = "MODE")]
    rounding: Option<RoundingMode>,

    /// Round the grand total to whole units
    #[arg(long)]
    round_off: bool,
}

impl ContextArgs {
    fn overrides(&self) -> CliOverrides {
        let is_inter = match (self.inter, self.intra) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        CliOverrides {
            is_inter,
            precision: self.precision,
            tax_exemption: self.exempt.then_some(true),
            rounding: self.rounding,
            round_off_grand_total: self.round_off.then_some(true),
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Price(args) => {
            let config = load_config(cli.config, &args.context)?;
            run_price(&args, &config)
        }
        Commands::CheckConfig(args) => {
            let config = load_config(cli.config, &args)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,quotewise=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>, args: &ContextArgs) -> Result<PricingConfig> {
    let config = PricingConfig::load(path, &args.overrides()).context("loading pricing configuration")?;
    debug!(?config, "Effective pricing configuration");
    Ok(config)
}

fn run_price(args: &PriceArgs, config: &PricingConfig) -> Result<()> {
    let document = match args.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
            CartDocument::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("reading {}", path.display()))?
        }
        _ => CartDocument::from_reader(std::io::stdin().lock()).context("reading cart from stdin")?,
    };

    let priced = price_document(&document, &config.to_context(), args.volume_discount)?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &priced)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_price_flags() {
        let cli = Cli::try_parse_from([
            "quotewise",
            "price",
            "cart.json",
            "--inter",
            "--precision",
            "3",
            "--volume-discount",
            "7.5",
            "--rounding",
            "half_even",
        ])
        .unwrap();

        let Commands::Price(args) = cli.command else {
            panic!("expected price command");
        };
        assert_eq!(args.file, Some(PathBuf::from("cart.json")));
        assert_eq!(args.volume_discount, Some(Decimal::new(75, 1)));

        let overrides = args.context.overrides();
        assert_eq!(overrides.is_inter, Some(true));
        assert_eq!(overrides.precision, Some(3));
        assert_eq!(overrides.rounding, Some(RoundingMode::HalfEven));
        assert_eq!(overrides.tax_exemption, None);
    }

    #[test]
    fn test_inter_and_intra_conflict() {
        assert!(Cli::try_parse_from(["quotewise", "price", "--inter", "--intra"]).is_err());
    }

    #[test]
    fn test_intra_flag() {
        let cli = Cli::try_parse_from(["quotewise", "check-config", "--intra", "--exempt"]).unwrap();
        let Commands::CheckConfig(args) = cli.command else {
            panic!("expected check-config command");
        };
        let overrides = args.overrides();
        assert_eq!(overrides.is_inter, Some(false));
        assert_eq!(overrides.tax_exemption, Some(true));
    }
}
