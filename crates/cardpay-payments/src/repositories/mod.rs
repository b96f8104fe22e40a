pub mod account;

pub use account::{PaymentGatewayAccountRepository, SqlitePaymentGatewayAccountRepository};
