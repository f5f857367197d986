use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A single metered quantity together with the unit string the meter
/// reported for it. Units are carried verbatim ("kWh", "kW", "m3") and
/// never converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

/// Energy import registers: the two tariff accumulators plus the
/// instantaneous active power draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerImport {
    pub t1: Measurement,
    pub t2: Measurement,
    pub active: Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Power {
    pub import: PowerImport,
}

/// Gas register reading. The gas meter logs its own measurement moment,
/// which usually lags the electricity timestamp by up to an hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasReading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
}

/// One fully validated telegram. Constructed fresh per parse, immutable
/// afterwards; both timestamps are UTC instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTelegram {
    pub timestamp: DateTime<Utc>,
    pub power: Power,
    pub gas: GasReading,
}
