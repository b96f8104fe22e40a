use crate::{Result, constants::WCPAY_GATEWAY_ID, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store (site) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(i64);

impl SiteId {
    /// Create a new site ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is not positive.
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidIdentifier(format!(
                "Site ID must be positive, got {id}"
            )));
        }
        Ok(SiteId(id))
    }

    /// Get the raw site ID.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SiteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidIdentifier(format!("Invalid site ID: {s}")))?;
        SiteId::new(id)
    }
}

/// Order identifier within a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Create a new order ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is not positive.
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidIdentifier(format!(
                "Order ID must be positive, got {id}"
            )));
        }
        Ok(OrderId(id))
    }

    /// Get the raw order ID.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates and trims an opaque string identifier.
fn opaque_id(kind: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidIdentifier(format!("{kind} must not be empty")));
    }
    if value.chars().any(char::is_control) {
        return Err(Error::InvalidIdentifier(format!(
            "{kind} must not contain control characters"
        )));
    }
    Ok(value.to_string())
}

/// Card reader identifier as reported by the vendor SDK (usually the serial number).
///
/// Two discovery events refer to the same physical reader exactly when their
/// identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReaderId(String);

impl ReaderId {
    /// Create a new reader ID.
    ///
    /// The value is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is empty or contains control characters.
    pub fn new(id: &str) -> Result<Self> {
        opaque_id("Reader ID", id).map(ReaderId)
    }

    /// Get the reader ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReaderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReaderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ReaderId::new(s)
    }
}

/// Payment processor intent identifier (e.g. `pi_3Jx...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentIntentId(String);

impl PaymentIntentId {
    /// Create a new payment intent ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is empty or contains control characters.
    pub fn new(id: &str) -> Result<Self> {
        opaque_id("Payment intent ID", id).map(PaymentIntentId)
    }

    /// Get the intent ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PaymentIntentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PaymentIntentId::new(s)
    }
}

/// Payment gateway identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayId(String);

impl GatewayId {
    /// Create a new gateway ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is empty or contains control characters.
    pub fn new(id: &str) -> Result<Self> {
        opaque_id("Gateway ID", id).map(GatewayId)
    }

    /// The WooCommerce Payments gateway, currently the only supported one.
    #[must_use]
    pub fn wcpay() -> Self {
        GatewayId(WCPAY_GATEWAY_ID.to_string())
    }

    /// Get the gateway ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GatewayId {
    fn default() -> Self {
        Self::wcpay()
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
