//! Common types shared across card reader implementations.

use cardpay_core::ReaderId;
use serde::{Deserialize, Serialize};

/// How a reader is attached to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderConnectionType {
    /// Bluetooth Low Energy reader (e.g. a pocket reader).
    Bluetooth,

    /// Reader attached by cable.
    Usb,
}

impl ReaderConnectionType {
    /// Whether discovering or connecting this reader needs the Bluetooth radio.
    pub fn uses_radio(&self) -> bool {
        matches!(self, Self::Bluetooth)
    }
}

/// A card reader announced by the vendor SDK.
///
/// Readers are ephemeral: they only exist for the duration of a discovery
/// and connection session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reader {
    /// Identifier reported by the SDK, stable across announcements.
    pub id: ReaderId,

    /// Human readable name shown to the merchant.
    pub name: String,

    /// Battery level between 0.0 and 1.0, when the reader reports it.
    pub battery_level: Option<f32>,

    /// Received signal strength in dBm, when the reader reports it.
    pub signal_strength: Option<i16>,

    /// Transport used to reach the reader.
    pub connection_type: ReaderConnectionType,

    /// Optional serial number.
    pub serial_number: Option<String>,
}

impl Reader {
    /// Create a new Bluetooth reader with the required fields.
    pub fn new(id: ReaderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            battery_level: None,
            signal_strength: None,
            connection_type: ReaderConnectionType::Bluetooth,
            serial_number: None,
        }
    }

    /// Set the battery level, clamped to `0.0..=1.0`.
    pub fn with_battery_level(mut self, level: f32) -> Self {
        self.battery_level = Some(level.clamp(0.0, 1.0));
        self
    }

    /// Set the signal strength.
    pub fn with_signal_strength(mut self, rssi: i16) -> Self {
        self.signal_strength = Some(rssi);
        self
    }

    /// Set the connection type.
    pub fn with_connection_type(mut self, connection_type: ReaderConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Battery level as a whole percentage, if known.
    pub fn battery_percent(&self) -> Option<u8> {
        self.battery_level.map(|level| (level * 100.0).round() as u8)
    }

    /// Name to show in prompts, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
