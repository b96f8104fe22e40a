//! Shared constants for the in-person payment flow.
//!
//! Values here are used by more than one crate: the payment gateway
//! identifier that keys persisted accounts, the bounds of transition
//! history, and default timeouts for remote calls and reader connects.
//!
//! # Usage
//!
//! ```
//! use cardpay_core::constants::*;
//!
//! assert_eq!(WCPAY_GATEWAY_ID, "woocommerce-payments");
//!
//! use std::time::Duration;
//! let timeout = Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 15);
//! ```

// ============================================================================
// Payment Gateway
// ============================================================================

/// Gateway identifier for WooCommerce Payments.
///
/// This is currently the only gateway with card-present support, and there
/// is exactly one account per site for it. Persisted accounts are keyed by
/// `(site_id, gateway_id)`.
pub const WCPAY_GATEWAY_ID: &str = "woocommerce-payments";

/// Payment intent status reported by the processor when a charge completed.
pub const INTENT_STATUS_SUCCEEDED: &str = "succeeded";

// ============================================================================
// Reader Session
// ============================================================================

/// Maximum number of state transitions kept per connection session.
pub const MAX_TRANSITION_HISTORY: usize = 100;

/// Default capacity of the discovery event channel.
///
/// Readers are announced far slower than the flow consumes them; the bound
/// only matters when a misbehaving SDK floods callbacks.
pub const DEFAULT_DISCOVERY_BUFFER: usize = 64;

/// Default timeout for connecting to a selected reader (milliseconds).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Remote API
// ============================================================================

/// Default timeout for remote payment API requests (milliseconds).
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 15_000;

/// Default connect timeout for remote payment API requests (milliseconds).
pub const DEFAULT_REMOTE_CONNECT_TIMEOUT_MS: u64 = 5_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_id_is_stable() {
        assert_eq!(WCPAY_GATEWAY_ID, "woocommerce-payments");
    }

    #[test]
    fn test_timeouts_are_ordered() {
        assert!(DEFAULT_REMOTE_CONNECT_TIMEOUT_MS < DEFAULT_REMOTE_TIMEOUT_MS);
        assert!(DEFAULT_REMOTE_TIMEOUT_MS < DEFAULT_CONNECT_TIMEOUT_MS);
    }
}
