//! Command-line arguments for `alya`

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shared::PaymentMethod;

/// Dulce Alya POS - data sync console
#[derive(Parser)]
#[command(name = "alya", version)]
#[command(about = "Dulce Alya point of sale: local cache, file and cloud drive sync", long_about = None)]
pub struct Cli {
    /// Working directory (cache, handle store, logs)
    #[arg(long, env = "ALYA_WORK_DIR", global = true)]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the sync mode and save state
    Status,

    /// Link a local snapshot file and load its contents
    ConnectLocal {
        /// Existing snapshot file; omit to reconnect the stored one
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Sign in to the cloud drive and sync with the backup folder
    ConnectCloud {
        /// Drive API key (stored for later runs)
        #[arg(long)]
        api_key: Option<String>,

        /// OAuth client id (stored for later runs)
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Sign out of the cloud drive
    DisconnectCloud,

    /// Unlink the local snapshot file
    DisconnectLocal,

    /// Save now to the active backend
    Save,

    /// Download a dated backup copy
    Export,

    /// Replace all data with a snapshot file (not linked)
    Import {
        /// Snapshot file
        path: PathBuf,
    },

    /// Check staff credentials (recorded in the login history)
    Login {
        #[arg(long)]
        user: String,

        #[arg(long)]
        password: String,
    },

    /// List the product catalog
    Products,

    /// Record a sale
    Sell {
        /// Line item as `<product-id>:<quantity>`, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<ItemArg>,

        /// tarjeta | efectivo | transferencia | nequi
        #[arg(long)]
        payment: PaymentMethod,

        /// Customer name (defaults to the generic customer)
        #[arg(long)]
        customer: Option<String>,
    },

    /// Keep syncing in the foreground until Ctrl-C
    Watch,
}

/// `<product-id>:<quantity>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemArg {
    pub product_id: String,
    pub quantity: u32,
}

impl std::str::FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, qty) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected <product-id>:<quantity>, got `{s}`"))?;
        let quantity: u32 = qty
            .parse()
            .map_err(|_| format!("invalid quantity `{qty}`"))?;
        if id.is_empty() || quantity == 0 {
            return Err(format!("invalid item `{s}`"));
        }
        Ok(Self {
            product_id: id.to_string(),
            quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_arg() {
        let item: ItemArg = "7:2".parse().unwrap();
        assert_eq!(item.product_id, "7");
        assert_eq!(item.quantity, 2);
        assert!("7".parse::<ItemArg>().is_err());
        assert!("7:0".parse::<ItemArg>().is_err());
        assert!(":2".parse::<ItemArg>().is_err());
    }

    #[test]
    fn test_sell_args() {
        let cli = Cli::try_parse_from([
            "alya", "sell", "--item", "1:2", "--item", "7:2", "--payment", "efectivo",
        ])
        .unwrap();
        match cli.command {
            Command::Sell { items, payment, customer } => {
                assert_eq!(items.len(), 2);
                assert_eq!(payment, PaymentMethod::Cash);
                assert!(customer.is_none());
            }
            _ => panic!("expected sell"),
        }
    }
}
