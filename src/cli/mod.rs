//! Command-line parsing for the checkout binary.
//!
//! Arguments are a command name followed by `--key=value` flags, e.g.
//! `remi-checkout place --user=u1 --token=... --street=... --payment-method=card`.

use std::collections::HashMap;

use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::{CheckoutError, CreateOrderRequest, parse_status};
use crate::config::ConfigError;
use crate::domain::{OrderStatus, ShippingAddress};
use crate::storage::StorageError;

/// Environment variable consulted when `--token` is not given.
pub const CART_SERVICE_TOKEN_ENV: &str = "CART_SERVICE_TOKEN";

/// Command is one invocation of the binary.
#[derive(Debug, Clone)]
pub enum Command {
    Place {
        user_id: String,
        token: Option<String>,
        request: CreateOrderRequest,
    },
    List {
        user_id: String,
        status: Option<OrderStatus>,
        page: Option<u32>,
        limit: Option<u32>,
    },
    Get {
        user_id: String,
        order_id: String,
    },
    Cancel {
        user_id: String,
        order_id: String,
    },
    SetStatus {
        order_id: String,
        status: OrderStatus,
    },
}

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("missing command (expected one of: place, list, get, cancel, set-status)")]
    MissingCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing required flag --{0}")]
    MissingFlag(&'static str),

    #[error("invalid value for --{flag}: {value}")]
    InvalidFlag { flag: &'static str, value: String },

    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Parsed `--key=value` flags.
#[derive(Debug, Default)]
struct Flags(HashMap<String, String>);

impl Flags {
    fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }

    fn require(&self, name: &'static str) -> Result<String, CliError> {
        self.get(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or(CliError::MissingFlag(name))
    }

    fn number(&self, name: &'static str) -> Result<Option<u32>, CliError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| CliError::InvalidFlag { flag: name, value }),
        }
    }

    fn status(&self, name: &'static str) -> Result<Option<OrderStatus>, CliError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => parse_status(&value)
                .map(Some)
                .map_err(|_| CliError::InvalidFlag { flag: name, value }),
        }
    }
}

/// Parses the process arguments (without the program name).
///
/// `--config=` is accepted anywhere and left to the caller.
pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut command = None;
    let mut flags = Flags::default();

    for arg in args {
        if let Some(flag) = arg.strip_prefix("--") {
            let (key, value) = flag
                .split_once('=')
                .ok_or_else(|| CliError::MalformedArgument(arg.clone()))?;
            flags.0.insert(key.to_string(), value.to_string());
        } else if command.is_none() {
            command = Some(arg);
        } else {
            return Err(CliError::MalformedArgument(arg));
        }
    }

    let command = command.ok_or(CliError::MissingCommand)?;

    match command.as_str() {
        "place" => Ok(Command::Place {
            user_id: flags.require("user")?,
            token: flags.get("token"),
            // Blank address fields are left for the service to reject.
            request: CreateOrderRequest {
                shipping_address: ShippingAddress {
                    street: flags.get("street").unwrap_or_default(),
                    city: flags.get("city").unwrap_or_default(),
                    country: flags.get("country").unwrap_or_default(),
                    postal_code: flags.get("postal-code").unwrap_or_default(),
                },
                payment_method: flags.get("payment-method").unwrap_or_default(),
                idempotency_key: flags.get("idempotency-key"),
            },
        }),
        "list" => Ok(Command::List {
            user_id: flags.require("user")?,
            status: flags.status("status")?,
            page: flags.number("page")?,
            limit: flags.number("limit")?,
        }),
        "get" => Ok(Command::Get {
            user_id: flags.require("user")?,
            order_id: flags.require("order")?,
        }),
        "cancel" => Ok(Command::Cancel {
            user_id: flags.require("user")?,
            order_id: flags.require("order")?,
        }),
        "set-status" => Ok(Command::SetStatus {
            order_id: flags.require("order")?,
            status: flags.status("status")?.ok_or(CliError::MissingFlag("status"))?,
        }),
        other => Err(CliError::UnknownCommand(other.to_string())),
    }
}
