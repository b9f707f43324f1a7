//! `alya` - Dulce Alya sync console
//!
//! Each invocation restores the session, runs one command and shuts the
//! orchestrator down, which flushes any change still waiting on the debounce.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;

use alya_sync::{
    ApiCredentials, CartItem, CheckoutDetails, FlushOutcome, SyncConfig, SyncMode,
    SyncOrchestrator, logging,
};
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = SyncConfig::from_env();
    if let Some(dir) = &cli.work_dir {
        config.work_dir = dir.clone();
        if std::env::var_os("ALYA_DOWNLOAD_DIR").is_none() {
            config.download_dir = config.paths().downloads_dir();
        }
    }
    let _log_guard = logging::init(&config.paths().logs_dir())
        .context("Failed to initialize logging")?;
    tracing::info!(work_dir = %config.work_dir.display(), "Dulce Alya sync starting");

    let selection = match &cli.command {
        Command::ConnectLocal { file } => file.clone(),
        _ => None,
    };
    let orchestrator = SyncOrchestrator::with_native(config, selection)
        .context("Failed to open the data directory")?;
    orchestrator.start().await;

    if orchestrator.sync_status().needs_reauth
        && !matches!(cli.command, Command::DisconnectCloud)
    {
        // Non-interactive token: try once, keep going without cloud on failure
        if let Err(e) = orchestrator.reauthenticate_cloud().await {
            eprintln!("Cloud session needs sign-in: {e}");
        }
    }

    let result = run(&orchestrator, cli.command).await;
    orchestrator.shutdown().await;
    result
}

async fn run(orchestrator: &SyncOrchestrator, command: Command) -> Result<()> {
    match command {
        Command::Status => print_status(orchestrator),

        Command::ConnectLocal { file } => {
            if file.is_some() {
                orchestrator.disconnect_local().await?;
            }
            let outcome = orchestrator.connect_local().await?;
            println!("{outcome:?}");
            print_status(orchestrator);
        }

        Command::ConnectCloud { api_key, client_id } => {
            let credentials = match (api_key, client_id) {
                (Some(api_key), Some(client_id)) => ApiCredentials::new(api_key, client_id),
                (None, None) => orchestrator
                    .stored_credentials()
                    .context("No stored credentials: pass --api-key and --client-id")?,
                _ => bail!("--api-key and --client-id must be given together"),
            };
            let outcome = orchestrator.connect_cloud(credentials).await?;
            println!("{outcome:?}");
            if let Some(user) = orchestrator.drive_user() {
                println!("Signed in as {} <{}>", user.name, user.email);
            }
        }

        Command::DisconnectCloud => {
            orchestrator.disconnect_cloud().await?;
            print_status(orchestrator);
        }

        Command::DisconnectLocal => {
            orchestrator.disconnect_local().await?;
            print_status(orchestrator);
        }

        Command::Save => match orchestrator.manual_save().await {
            FlushOutcome::Failed(reason) => bail!("Save failed: {reason}"),
            outcome => println!("{outcome:?}"),
        },

        Command::Export => {
            let path = orchestrator.export_backup().await?;
            println!("Backup written to {}", path.display());
        }

        Command::Import { path } => {
            orchestrator.import_file(&path).await?;
            let snapshot = orchestrator.snapshot();
            println!(
                "Imported {} invoices, {} products",
                snapshot.invoices.len(),
                snapshot.products.len()
            );
        }

        Command::Login { user, password } => {
            let event = orchestrator.login(&user, &password)?;
            println!("{} {:?}", event.user, event.status);
        }

        Command::Products => {
            for product in orchestrator.products() {
                println!(
                    "{:>4}  {:<24} {:<10} {:>8}{}",
                    product.id,
                    product.name,
                    product.category.to_string(),
                    product.price,
                    if product.available { "" } else { "  (agotado)" }
                );
            }
        }

        Command::Sell {
            items,
            payment,
            customer,
        } => {
            let mut cart = Vec::with_capacity(items.len());
            for item in items {
                let product = orchestrator
                    .product(&item.product_id)
                    .with_context(|| format!("Unknown product `{}`", item.product_id))?;
                cart.push(CartItem::new(product, item.quantity));
            }
            let mut details = CheckoutDetails::new(payment);
            if let Some(name) = customer {
                details = details.with_customer(name);
            }
            let invoice = orchestrator.checkout(&cart, details)?;
            println!("{} total {}", invoice.folio, invoice.total);
        }

        Command::Watch => {
            print_status(orchestrator);
            if orchestrator.mode() == SyncMode::Disconnected {
                println!("Not connected: nothing to sync until a backend is linked");
            }
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
        }
    }
    Ok(())
}

fn print_status(orchestrator: &SyncOrchestrator) {
    let status = orchestrator.sync_status();
    println!("mode:          {}", status.mode);
    println!("file linked:   {}", status.has_handle);
    println!("saving:        {}", status.is_saving);
    if status.needs_reauth {
        println!("cloud:         sign-in required");
    }
    if let Some(at) = status.last_saved_at {
        println!("last saved at: {at}");
    }
}
