//! `cardpay`: drive the in-person payment flow from a terminal.
//!
//! Account and capture commands talk to the remote payment API and the
//! local account cache; `connect` runs a reader session against the mock
//! SDK, gated by onboarding readiness.

mod demo;
mod presenter;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use cardpay_connection::ConnectionState;
use cardpay_core::constants::DEFAULT_CONNECT_TIMEOUT_MS;
use cardpay_core::{OrderId, PaymentIntentId, SiteId};
use cardpay_onboarding::{OnboardingReadiness, OnboardingReadinessGate, ProceedOutcome};
use cardpay_payments::{
    Database, DatabaseConfig, HttpPaymentRemote, PaymentGatewayAccountCoordinator, RemoteConfig,
    SqlitePaymentGatewayAccountRepository,
};
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::demo::{DemoOptions, Failure};
use crate::presenter::TracingPresenter;

#[derive(Parser, Debug)]
#[command(name = "cardpay", version, about = "In-person card payment flow")]
struct Args {
    /// Path of the local account cache
    #[arg(long, env = "CARDPAY_DATABASE", default_value = "cardpay.db")]
    database: String,

    /// Base URL of the payment API
    #[arg(long, env = "CARDPAY_API_BASE", default_value = "http://127.0.0.1:8080")]
    api_base: String,

    /// Site to operate on
    #[arg(long, env = "CARDPAY_SITE_ID")]
    site_id: SiteId,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the payment account and refresh the local cache
    LoadAccount,

    /// Show the cached payment account and onboarding readiness
    Readiness,

    /// Capture the payment of an order
    Capture {
        #[arg(long)]
        order_id: i64,

        #[arg(long)]
        payment_intent_id: String,
    },

    /// Connect to a simulated card reader
    Connect {
        /// Number of readers the simulated scan finds
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=32))]
        readers: u8,

        /// Inject a failure into the session
        #[arg(long, value_enum)]
        fail: Option<Failure>,

        /// Connect timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_MS)]
        connect_timeout_ms: u64,

        /// Treat onboarding as completed if the account is not ready
        #[arg(long)]
        complete_onboarding: bool,
    },
}

type Coordinator =
    PaymentGatewayAccountCoordinator<HttpPaymentRemote, SqlitePaymentGatewayAccountRepository>;

async fn coordinator(args: &Args) -> Result<Coordinator> {
    let db = Database::open(DatabaseConfig::new(&args.database))
        .await
        .with_context(|| format!("opening account cache {}", args.database))?;
    let remote = HttpPaymentRemote::new(RemoteConfig::new(&args.api_base))?;

    Ok(PaymentGatewayAccountCoordinator::new(
        remote,
        SqlitePaymentGatewayAccountRepository::new(db.pool().clone()),
    ))
}

async fn readiness(coordinator: &Coordinator, site_id: SiteId) -> Result<OnboardingReadiness> {
    let account = coordinator.account(site_id).await?;
    Ok(OnboardingReadiness::from_account(account.as_ref()))
}

async fn connect(args: &Args, options: DemoOptions, complete_onboarding: bool) -> Result<()> {
    let coordinator = coordinator(args).await?;
    let initial = readiness(&coordinator, args.site_id).await?;

    let mut gate = OnboardingReadinessGate::new(TracingPresenter, initial);
    let (ready_tx, ready_rx) = oneshot::channel();
    let outcome = gate.check_and_proceed(move || {
        let _ = ready_tx.send(());
    });

    if let ProceedOutcome::Deferred(pending) = outcome {
        if !complete_onboarding {
            pending.dismiss();
            bail!("site {} is not ready: {}", args.site_id, gate.readiness());
        }
        info!("Completing onboarding");
        gate.publish(OnboardingReadiness::Ready);
    }

    ready_rx.await.context("onboarding did not complete")?;

    match demo::run(options).await? {
        ConnectionState::Connected(reader) => {
            info!("Connected to {}", reader.display_name());
            Ok(())
        }
        ConnectionState::Failed(error) => bail!("connection failed: {}", error),
        other => {
            warn!("Connection ended in {}", other.phase());
            Ok(())
        }
    }
}

async fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::LoadAccount => {
            let coordinator = coordinator(&args).await?;
            coordinator.load_account(args.site_id).await?;
            info!(
                "Account loaded, readiness: {}",
                readiness(&coordinator, args.site_id).await?
            );
        }
        Command::Readiness => {
            let coordinator = coordinator(&args).await?;
            match coordinator.account(args.site_id).await? {
                Some(account) => info!(
                    "Account {} ({}, {})",
                    account.status, account.country, account.default_currency
                ),
                None => info!("No cached account for site {}", args.site_id),
            }
            info!("Readiness: {}", readiness(&coordinator, args.site_id).await?);
        }
        Command::Capture {
            order_id,
            payment_intent_id,
        } => {
            let coordinator = coordinator(&args).await?;
            let order_id = OrderId::new(*order_id)?;
            let intent_id = PaymentIntentId::new(payment_intent_id)?;
            coordinator
                .capture_payment(args.site_id, order_id, &intent_id)
                .await?;
            info!("Payment for order {} captured", order_id);
        }
        Command::Connect {
            readers,
            fail,
            connect_timeout_ms,
            complete_onboarding,
        } => {
            let options = DemoOptions {
                readers: usize::from(*readers),
                failure: *fail,
                connect_timeout: Duration::from_millis(*connect_timeout_ms),
            };
            connect(&args, options, *complete_onboarding).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Args::parse()).await
}
