//! # Cart Service
//!
//! Command-line producer for order events. Validates a create or update
//! request and publishes it to the orders topic, keyed by order id.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use order_pipeline::bootstrap::bootstrap_producer;
use order_pipeline::config::ConfigManager;
use order_pipeline::logging::init_structured_logging;
use order_pipeline::validation::{CreateOrderRequest, UpdateOrderRequest};

#[derive(Parser)]
#[command(name = "cart-service")]
#[command(about = "Publish order create/update events")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration directory (default: $ORDERS_CONFIG_DIR or ./config)
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment override (default: $ORDERS_ENV, $APP_ENV or development)
    #[arg(short, long, global = true)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a new order
    Create {
        #[arg(long)]
        order_id: String,

        #[arg(long)]
        items_num: i64,

        #[arg(long)]
        total_amount: f64,
    },

    /// Publish a status update for an existing order
    Update {
        #[arg(long)]
        order_id: String,

        /// pending or confirmed
        #[arg(long)]
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.environment {
        Some(env) => ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), env),
        None => ConfigManager::load_from_directory(cli.config_dir.clone()),
    }
    .context("failed to load configuration")?;
    init_structured_logging(&manager.config().logging);

    let producer = bootstrap_producer(manager.config()).await;
    if !producer.is_ready() {
        warn!("⚠️ CART_SERVICE: Broker unavailable, the order will not be published");
    }

    let message = match cli.command {
        Commands::Create {
            order_id,
            items_num,
            total_amount,
        } => {
            producer
                .submit_create(CreateOrderRequest {
                    order_id,
                    items_num,
                    total_amount,
                })
                .await?
        }
        Commands::Update { order_id, status } => {
            producer
                .submit_update(UpdateOrderRequest { order_id, status })
                .await?
        }
    };

    if producer.abandoned_count() > 0 {
        anyhow::bail!("order {} was not acknowledged by the broker", message.order_id);
    }

    info!(
        order_id = %message.order_id,
        status = %message.status,
        topic = %producer.topic(),
        "✅ CART_SERVICE: Order event published"
    );
    println!("{}", message.to_json()?);
    Ok(())
}
