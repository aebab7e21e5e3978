mod cart;
mod checkout;
mod cli;
mod config;
mod domain;
mod notification;
mod payment;
mod storage;

use cart::{HttpCartClient, HttpCartConfig};
use checkout::{OrderService, ServiceConfig};
use cli::{CART_SERVICE_TOKEN_ENV, CliError, Command};
use config::Config;
use notification::{LogNotifier, Notifier};
use payment::SimulatedPaymentGateway;
use std::env;
use std::sync::Arc;
use storage::{OrderStorage, SqliteStorage, SqliteStorageConfig};
use tracing::{Level, debug, error, info};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    // Logs go to stderr so stdout carries only the JSON result.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let command = match cli::parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let config_path = parse_config_path();
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.log_level.as_deref());
    debug!(config = %config_path, env = %config.app.env, "Configuration loaded");

    match run(&config, command).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!(error = %e, "Command failed");
            std::process::exit(1);
        }
    }
}

/// Wires the service from configuration and executes one command.
/// Returns the JSON document to print.
async fn run(config: &Config, command: Command) -> Result<String, CliError> {
    let storage = Arc::new(SqliteStorage::new(SqliteStorageConfig::from(&config.storage)).await?);

    let notifier: Arc<dyn Notifier> = if config.app.is_development() {
        Arc::new(LogNotifier::new())
    } else {
        Arc::new(LogNotifier::failures_only())
    };

    let service = OrderService::new(
        ServiceConfig::from(config),
        storage.clone(),
        Arc::new(SimulatedPaymentGateway::new()),
        notifier.clone(),
    );

    info!(app = %config.app.name, "Checkout service ready");

    let output = match command {
        Command::Place {
            user_id,
            token,
            request,
        } => {
            let token = token
                .or_else(|| env::var(CART_SERVICE_TOKEN_ENV).ok())
                .ok_or(CliError::MissingFlag("token"))?;
            let client = HttpCartClient::new(HttpCartConfig::from(&config.cart))?;
            let cart = client.authorize(&user_id, &token)?;

            let order = service.create_order(&cart, &user_id, request).await?;
            serde_json::to_string_pretty(&order)?
        }
        Command::List {
            user_id,
            status,
            page,
            limit,
        } => {
            let page = service.list_orders(&user_id, status, page, limit).await?;
            serde_json::to_string_pretty(&page)?
        }
        Command::Get { user_id, order_id } => {
            let order = service.get_order(&user_id, &order_id).await?;
            serde_json::to_string_pretty(&order)?
        }
        Command::Cancel { user_id, order_id } => {
            let order = service.cancel_order(&user_id, &order_id).await?;
            serde_json::to_string_pretty(&order)?
        }
        Command::SetStatus { order_id, status } => {
            let order = service.set_order_status(&order_id, status).await?;
            serde_json::to_string_pretty(&order)?
        }
    };

    if let Err(e) = notifier.close().await {
        debug!(error = %e, "Failed to close notifier");
    }
    if let Err(e) = storage.close().await {
        debug!(error = %e, "Failed to close order storage");
    }

    Ok(output)
}
