use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use crate::models::Measurement;
use super::ParseError;

lazy_static! {
    // OBIS code A-B:C.D.E followed by one or more parenthesized groups
    static ref OBIS_LINE: Regex =
        Regex::new(r"^(\d+-\d+:\d+\.\d+\.\d+)((?:\([^()]*\))+)$").unwrap();
    static ref GROUP: Regex = Regex::new(r"\(([^()]*)\)").unwrap();
    static ref COMPACT_TIMESTAMP: Regex = Regex::new(r"^\d{12}[SW]$").unwrap();
}

/// One decoded data line: the reference code, its value*unit groups in
/// order, and the compact timestamp when the line carries one.
#[derive(Debug, Clone, PartialEq)]
pub struct ObisLine {
    pub code: String,
    pub values: Vec<Measurement>,
    pub raw_timestamp: Option<String>,
}

/// Decode a single data line.
///
/// Lines that do not match the OBIS grammar at all yield `Ok(None)`:
/// meters emit vendor-specific lines the mapper does not need, so
/// unrecognized shapes are skipped rather than failed. A line that does
/// match but carries non-numeric (or non-finite, or negative) value text
/// is a hard error naming the code, since that indicates corruption the
/// frame CRC treats as opaque bytes.
pub fn parse_line(line: &str) -> Result<Option<ObisLine>, ParseError> {
    let line = line.trim();

    let caps = match OBIS_LINE.captures(line) {
        Some(caps) => caps,
        None => {
            debug!("Skipping non-OBIS line '{}'", line);
            return Ok(None);
        }
    };

    let code = caps[1].to_string();
    let mut values = Vec::new();
    let mut raw_timestamp = None;

    for group in GROUP.captures_iter(&caps[2]) {
        let content = &group[1];

        if COMPACT_TIMESTAMP.is_match(content) {
            if raw_timestamp.is_none() {
                raw_timestamp = Some(content.to_string());
            }
            continue;
        }

        // Groups without a unit separator (equipment ids, tariff words,
        // empty groups) carry nothing the mapper reads.
        let Some((value_text, unit)) = content.rsplit_once('*') else {
            continue;
        };

        let value: f64 = value_text.parse()
            .map_err(|_| ParseError::InvalidFieldValue(code.clone()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::InvalidFieldValue(code.clone()));
        }

        values.push(Measurement { value, unit: unit.to_string() });
    }

    Ok(Some(ObisLine { code, values, raw_timestamp }))
}
