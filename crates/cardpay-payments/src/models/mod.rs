pub mod account;

pub(crate) use account::AccountRow;
pub use account::{AccountStatus, PaymentGatewayAccount};
