//! Mock SDK implementations for testing and development.
//!
//! This module provides a simulated card reader SDK that can be controlled
//! programmatically without requiring physical hardware.

pub mod card_reader;

// Re-export commonly used types
pub use card_reader::{MockCardReader, MockCardReaderHandle};
