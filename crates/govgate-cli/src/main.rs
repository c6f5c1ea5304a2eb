use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use govgate_gateway::Gateway;
use govgate_types::{GatewayConfig, OrderId, OrderRecord, constants};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "govgate")]
#[command(version, about = "Governance gateway: signed compliance packets for uploaded orders", long_about = None)]
#[command(after_help = "Reads GOVGATE_SECRET (required) and GOVGATE_DATA_DIR from the environment.")]
struct Cli {
    /// Root of uploads, exports, logs and the order store [overrides GOVGATE_DATA_DIR]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Accept a PDF and create an order
    Upload {
        /// Document to upload
        path: PathBuf,
    },

    /// Build, sign and publish the compliance packet (idempotent)
    Finalize {
        order_id: String,
    },

    /// Re-check the published export against its hash and signature
    Verify {
        order_id: String,
    },

    /// Verify the export and append it to the rail log
    Send {
        order_id: String,
    },

    /// Print one order, or list all orders
    Show {
        order_id: Option<String>,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Environment config, with `--data-dir` taking precedence.
fn load_config(data_dir: Option<PathBuf>) -> Result<GatewayConfig> {
    let from_env = GatewayConfig::from_env().context("failed to load configuration")?;
    Ok(match data_dir {
        Some(dir) => GatewayConfig::with_data_dir(dir).secret(from_env.require_secret()?.clone()),
        None => from_env,
    })
}

fn parse_id(raw: &str) -> Result<OrderId> {
    OrderId::parse(raw).with_context(|| format!("invalid order id {raw:?}"))
}

fn print_record(record: &OrderRecord) {
    println!("order_id={}", record.order_id);
    println!("uploaded_filename={}", record.uploaded_filename);
    println!("stored_filename={}", record.stored_filename);
    println!("mime={}", record.mime);
    println!("size_bytes={}", record.size_bytes);
    println!("uploaded_at={}", record.uploaded_at.to_rfc3339());
    println!("finalized={}", record.finalized);
    if let Some(packet) = &record.packet {
        println!("json_url={}", packet.json_url);
        println!("csv_url={}", packet.csv_url);
        println!("packet_hash={}", packet.packet_hash);
        println!("signature={}", packet.signature);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = load_config(cli.data_dir)?;
    debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    let mut gateway = Gateway::open(config).context("failed to open gateway")?;

    match cli.cmd {
        Commands::Upload { path } => {
            let contents =
                std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let record = gateway.upload(&filename, &contents)?;
            print_record(&record);
        }
        Commands::Finalize { order_id } => {
            let id = parse_id(&order_id)?;
            let reference = gateway.finalize(&id)?;
            println!("order_id={id}");
            println!("json_url={}", reference.json_url);
            println!("csv_url={}", reference.csv_url);
            println!("packet_hash={}", reference.packet_hash);
            println!("signature={}", reference.signature);
            eprintln!("{}", constants::SIMULATION_NOTICE);
        }
        Commands::Verify { order_id } => {
            let id = parse_id(&order_id)?;
            let packet = gateway.verify_export(&id)?;
            println!("verified=true order_id={id} packet_hash={}", packet.packet_hash);
        }
        Commands::Send { order_id } => {
            let id = parse_id(&order_id)?;
            let entry = gateway.send(&id)?;
            println!("sent=true {}", entry.to_line());
        }
        Commands::Show { order_id: Some(raw) } => {
            let record = gateway.get(&parse_id(&raw)?)?;
            print_record(&record);
        }
        Commands::Show { order_id: None } => {
            for id in gateway.order_ids()? {
                println!("{id}");
            }
        }
    }

    Ok(())
}
