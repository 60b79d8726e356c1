//! Holderflow CLI - query stored holders and transfers, or run a cycle
//!
//! Usage:
//!   holderflow_cli top-wallets
//!   holderflow_cli wallet-transactions 3
//!   holderflow_cli summarize 3 --start-date 2024-05-01 --end-date 2024-05-07
//!   holderflow_cli refresh

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use holderflow::ingest_core::IngestConfig;
use holderflow::pipeline::{
    mint_symbol, shutdown, summarize, IngestionEngine, SqliteTransferSink, TradeDirection,
};
use holderflow::pipeline::types::TransferRecord;
use std::sync::Arc;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

#[derive(Parser, Debug)]
#[command(author, version, about = "Holderflow CLI", long_about = None)]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "HOLDERFLOW_DB_PATH", default_value = "data/holderflow.db")]
    db_path: String,

    /// Token mint the holders belong to
    #[arg(long, env = "HOLDERFLOW_TARGET_MINT")]
    mint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current top holders
    TopWallets {
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },
    /// Show stored transfers of the holder at a 1-based position
    WalletTransactions { position: usize },
    /// Summarise a holder's transfers between two dates (UTC, inclusive)
    Summarize {
        position: usize,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
    },
    /// Run one discovery + scan cycle now
    Refresh,
}

fn require_mint(mint: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    mint.ok_or_else(|| "HOLDERFLOW_TARGET_MINT (or --mint) is required".into())
}

fn parse_day(value: &str, end_of_day: bool) -> Result<i64, Box<dyn std::error::Error>> {
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}' (expected YYYY-MM-DD): {}", value, e))?;
    let time = if end_of_day {
        day.and_hms_opt(23, 59, 59)
    } else {
        day.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc().timestamp())
        .ok_or_else(|| format!("Invalid date '{}'", value).into())
}

fn format_ts(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn print_transfer(record: &TransferRecord) {
    let mut line = format!(
        "{} - {} {}",
        format_ts(record.timestamp),
        record.direction.as_str(),
        record.amount
    );
    if let Some(price) = record.price {
        line.push_str(&format!(" at {:.6}", price));
        if let Some(counter) = &record.counter_mint {
            line.push_str(&format!(" {}", mint_symbol(counter)));
        }
    }
    if record.venue != holderflow::ingest_core::Venue::Unknown {
        line.push_str(&format!(" via {}", record.venue));
    }
    let color = match record.direction {
        TradeDirection::Buy => GREEN,
        TradeDirection::Sell => RED,
    };
    println!("{}{}{}", color, line, RESET);
}

async fn holder_address(
    sink: &SqliteTransferSink,
    mint: &str,
    position: usize,
) -> Result<String, Box<dyn std::error::Error>> {
    sink.holder_at_rank(mint, position)
        .await?
        .map(|h| h.address)
        .ok_or_else(|| format!("No holder at position {} for {}", position, mint).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::TopWallets { limit } => {
            let mint = require_mint(cli.mint)?;
            let sink = SqliteTransferSink::open(&cli.db_path)?;
            let holders = sink.current_holders(&mint, limit).await?;
            if holders.is_empty() {
                println!("No holders stored for {} (run `refresh` first)", mint);
            }
            for (i, holder) in holders.iter().enumerate() {
                println!("{}. {} - {} tokens", i + 1, holder.address, holder.balance);
            }
        }
        Command::WalletTransactions { position } => {
            let mint = require_mint(cli.mint)?;
            let sink = SqliteTransferSink::open(&cli.db_path)?;
            let wallet = holder_address(&sink, &mint, position).await?;
            let transfers = sink.wallet_transfers(&wallet, i64::MIN, i64::MAX).await?;
            println!("{} ({} transfers)", wallet, transfers.len());
            for record in &transfers {
                print_transfer(record);
            }
        }
        Command::Summarize {
            position,
            start_date,
            end_date,
        } => {
            let mint = require_mint(cli.mint)?;
            let from = parse_day(&start_date, false)?;
            let to = parse_day(&end_date, true)?;
            if from > to {
                return Err("start date must not be after end date".into());
            }

            let sink = SqliteTransferSink::open(&cli.db_path)?;
            let wallet = holder_address(&sink, &mint, position).await?;
            let transfers = sink.wallet_transfers(&wallet, from, to).await?;

            let Some(summary) = summarize(&transfers) else {
                println!("No transactions to summarize.");
                return Ok(());
            };

            println!();
            println!("=== Wallet Transaction Summary ===");
            println!("Wallet: {}", wallet);
            println!("Total Transactions: {}", summary.total);
            println!("Buys: {} | Sells: {}", summary.buys, summary.sells);
            println!("Total Buy Volume: {}", summary.buy_volume);
            println!("Total Sell Volume: {}", summary.sell_volume);
            if let Some(price) = summary.avg_buy_price {
                println!("Average Buy Price: {:.6}", price);
            }
            if let Some(price) = summary.avg_sell_price {
                println!("Average Sell Price: {:.6}", price);
            }
            println!("Most Used Venue: {}", summary.most_used_venue);
            println!("First Transaction: {}", format_ts(summary.first_timestamp));
            println!("Last Transaction: {}", format_ts(summary.last_timestamp));
            println!("==================================");
        }
        Command::Refresh => {
            rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .map_err(|_| "Failed to install rustls crypto provider")?;

            let config = IngestConfig::from_env_with(|key| match key {
                "HOLDERFLOW_TARGET_MINT" => cli.mint.clone(),
                "HOLDERFLOW_DB_PATH" => Some(cli.db_path.clone()),
                _ => None,
            })?;

            let sink = Arc::new(SqliteTransferSink::open(&config.db_path)?);
            let engine = IngestionEngine::from_config(&config, sink)?;
            let (_handle, signal) = shutdown::channel();

            let report = engine.run_cycle(&signal).await?;
            println!(
                "✅ Refresh complete: {} holders, {} wallets scanned, {} transfers inserted",
                report.holders_found, report.wallets_scanned, report.transfers_inserted
            );
        }
    }

    Ok(())
}
