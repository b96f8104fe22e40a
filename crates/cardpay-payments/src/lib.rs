//! Payment gateway account cache and payment capture.
//!
//! This crate talks to the remote payment processor API and keeps a local
//! SQLite copy of the site's payment gateway account, which readiness checks
//! read before a card-present payment is offered.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool with embedded migrations
//! - [`PaymentGatewayAccountRepository`] - Account persistence, keyed by
//!   `(site_id, gateway_id)`
//! - [`PaymentRemote`] - Remote API boundary, [`HttpPaymentRemote`] over
//!   `reqwest`
//! - [`PaymentGatewayAccountCoordinator`] - Loads accounts and captures
//!   payments
//!
//! # Example
//!
//! ```no_run
//! use cardpay_core::{OrderId, PaymentIntentId, SiteId};
//! use cardpay_payments::{
//!     Database, DatabaseConfig, HttpPaymentRemote, PaymentGatewayAccountCoordinator,
//!     RemoteConfig, SqlitePaymentGatewayAccountRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(DatabaseConfig::new("cardpay.db")).await?;
//! let coordinator = PaymentGatewayAccountCoordinator::new(
//!     HttpPaymentRemote::new(RemoteConfig::new("https://shop.example/wp-json"))?,
//!     SqlitePaymentGatewayAccountRepository::new(db.pool().clone()),
//! );
//!
//! let site = SiteId::new(1)?;
//! coordinator.load_account(site).await?;
//! coordinator
//!     .capture_payment(site, OrderId::new(42)?, &PaymentIntentId::new("pi_123")?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod remote;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use coordinator::PaymentGatewayAccountCoordinator;
pub use error::{
    AccountLoadError, CaptureError, RemoteError, RemoteResult, StorageError, StorageResult,
};
pub use models::{AccountStatus, PaymentGatewayAccount};
pub use remote::{
    AccountPayload, HttpPaymentRemote, IntentStatus, PaymentCaptureRequest, PaymentIntent,
    PaymentRemote, RemoteConfig,
};
pub use repositories::{PaymentGatewayAccountRepository, SqlitePaymentGatewayAccountRepository};
