//! DSMR P1 telegram parsing library
//!
//! This library converts raw text telegrams from smart energy meters
//! (the DSMR protocol family, P1 port) into structured, checksum-verified,
//! timezone-normalized readings.

pub mod config;
pub mod models;
pub mod telegram;

// Re-export common types for easier access
pub use config::CONFIG;
pub use models::{GasReading, Measurement, ParsedTelegram, Power, PowerImport};
pub use telegram::timestamp::normalize_timestamp;
pub use telegram::{parse_telegram, DsmrManager, ParseError};
