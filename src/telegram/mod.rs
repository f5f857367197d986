use chrono_tz::Tz;
use log::{debug, error, info};
use thiserror::Error;
use tokio::sync::mpsc::{Receiver, Sender};
use crate::models::{GasReading, ParsedTelegram, Power, PowerImport};

pub mod tokenizer;
pub mod checksum;
pub mod obis;
pub mod mapper;
pub mod timestamp;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(&'static str),
    #[error("Truncated frame: {0}")]
    TruncatedFrame(&'static str),
    #[error("Checksum mismatch: telegram declares {declared}, computed {computed}")]
    ChecksumMismatch { declared: String, computed: String },
    #[error("Invalid value for OBIS code {0}")]
    InvalidFieldValue(String),
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),
    #[error("Invalid timestamp '{0}': {1}")]
    InvalidTimestamp(String, String),
}

/// Parse one raw P1 telegram into a validated reading.
///
/// The checksum is verified before any data line is interpreted; a frame
/// that fails the CRC gate is rejected wholesale. Pure function, so the
/// same raw text always yields the same result.
pub fn parse_telegram(raw: &str, home_tz: Tz) -> Result<ParsedTelegram, ParseError> {
    let frame = tokenizer::tokenize(raw)?;
    checksum::verify(&frame)?;

    let mut obis_lines = Vec::new();
    for line in &frame.lines {
        if let Some(obis_line) = obis::parse_line(line)? {
            obis_lines.push(obis_line);
        }
    }

    let fields = mapper::map_fields(&obis_lines)?;

    Ok(ParsedTelegram {
        timestamp: timestamp::normalize_timestamp(&fields.timestamp, home_tz)?,
        power: Power {
            import: PowerImport {
                t1: fields.t1,
                t2: fields.t2,
                active: fields.active,
            },
        },
        gas: GasReading {
            timestamp: timestamp::normalize_timestamp(&fields.gas_timestamp, home_tz)?,
            value: fields.gas_value.value,
            unit: fields.gas_value.unit,
        },
    })
}

/// Receives raw telegram text from the transport glue and forwards parsed
/// readings. Parse failures are logged with the raw input and dropped;
/// the meter retransmits every few seconds anyway.
pub struct DsmrManager {
    home_tz: Tz,
    sender: Sender<ParsedTelegram>,
}

impl DsmrManager {
    pub fn new(home_tz: Tz, sender: Sender<ParsedTelegram>) -> Self {
        Self { home_tz, sender }
    }

    pub async fn start_thread(&mut self, mut receiver: Receiver<String>) {
        info!("Starting DSMR P1 thread, home timezone {}", self.home_tz);

        while let Some(raw) = receiver.recv().await {
            debug!("Received DSMR P1 telegram ({} bytes)", raw.len());

            match parse_telegram(&raw, self.home_tz) {
                Ok(reading) => {
                    let _ = self.sender.send(reading).await;
                }
                Err(e) => {
                    error!("DSMR P1 telegram parse error: {} (raw: {:?})", e, raw);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Amsterdam;

    /// Assembles a telegram with the standard header and a checksum that
    /// matches the body, so tests exercise the real CRC gate.
    fn build_telegram(data_lines: &[&str]) -> String {
        let mut body = String::from("/ISk5\\2MT382-1000\r\n\r\n");
        for line in data_lines {
            body.push_str(line);
            body.push_str("\r\n");
        }
        body.push('!');
        let crc = checksum::compute(body.as_bytes());
        format!("{}{:04X}\r\n", body, crc)
    }

    fn full_telegram() -> String {
        build_telegram(&[
            "0-0:1.0.0(230615120000S)",
            "1-0:1.8.1(001234.567*kWh)",
            "1-0:1.8.2(002345.678*kWh)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(230615120000S)(01234.567*m3)",
        ])
    }

    #[test]
    fn test_parse_full_telegram() {
        let reading = parse_telegram(&full_telegram(), Amsterdam).unwrap();

        assert_eq!(reading.power.import.t1.value, 1234.567);
        assert_eq!(reading.power.import.t1.unit, "kWh");
        assert_eq!(reading.power.import.t2.value, 2345.678);
        assert_eq!(reading.power.import.active.value, 0.345);
        assert_eq!(reading.power.import.active.unit, "kW");
        assert_eq!(reading.gas.value, 1234.567);
        assert_eq!(reading.gas.unit, "m3");

        // 12:00 summer time in Amsterdam is 10:00 UTC
        let expected = Utc.with_ymd_and_hms(2023, 6, 15, 10, 0, 0).unwrap();
        assert_eq!(reading.timestamp, expected);
        assert_eq!(reading.gas.timestamp, expected);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let raw = full_telegram();
        let first = parse_telegram(&raw, Amsterdam).unwrap();
        let second = parse_telegram(&raw, Amsterdam).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupted_byte_fails_checksum() {
        let raw = full_telegram().replace("001234.567", "001234.568");
        match parse_telegram(&raw, Amsterdam) {
            Err(ParseError::ChecksumMismatch { declared, computed }) => {
                assert_ne!(declared, computed);
                assert_eq!(declared.len(), 4);
                assert_eq!(computed.len(), 4);
            }
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_are_aggregated() {
        // No tariff 2 line, and a gas register without its timestamp group.
        let raw = build_telegram(&[
            "0-0:1.0.0(230615120000S)",
            "1-0:1.8.1(001234.567*kWh)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(01234.567*m3)",
        ]);

        match parse_telegram(&raw, Amsterdam) {
            Err(ParseError::MissingRequiredField(missing)) => {
                assert_eq!(missing, vec!["power.import.t2".to_string(), "gas.timestamp".to_string()]);
            }
            other => panic!("expected missing field error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_obis_lines_are_ignored() {
        let raw = build_telegram(&[
            "0-0:1.0.0(230615120000S)",
            "1-0:1.8.1(001234.567*kWh)",
            "1-0:1.8.2(002345.678*kWh)",
            "1-0:2.8.1(000000.000*kWh)",
            "0-0:96.14.0(0002)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(230615120000S)(01234.567*m3)",
        ]);

        let reading = parse_telegram(&raw, Amsterdam).unwrap();
        assert_eq!(reading.power.import.t1.value, 1234.567);
    }

    #[test]
    fn test_corrupt_numeric_value_is_reported() {
        let raw = build_telegram(&[
            "0-0:1.0.0(230615120000S)",
            "1-0:1.8.1(00xx34.567*kWh)",
            "1-0:1.8.2(002345.678*kWh)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(230615120000S)(01234.567*m3)",
        ]);

        assert_eq!(
            parse_telegram(&raw, Amsterdam),
            Err(ParseError::InvalidFieldValue("1-0:1.8.1".to_string()))
        );
    }

    #[test]
    fn test_bad_meter_timestamp_is_reported() {
        let raw = build_telegram(&[
            "0-0:1.0.0(231315120000S)",
            "1-0:1.8.1(001234.567*kWh)",
            "1-0:1.8.2(002345.678*kWh)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(230615120000S)(01234.567*m3)",
        ]);

        assert!(matches!(
            parse_telegram(&raw, Amsterdam),
            Err(ParseError::InvalidTimestamp(_, _))
        ));
    }
}
