use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use crate::models::Measurement;
use super::obis::ObisLine;
use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldSlot {
    MeterTimestamp,
    EnergyImportT1,
    EnergyImportT2,
    ActivePower,
    GasRegister,
}

lazy_static! {
    /// Exact-match table from reference code to semantic field. Extended
    /// by adding entries, never by introspection; codes outside the table
    /// are ignored.
    static ref FIELD_TABLE: HashMap<&'static str, FieldSlot> = {
        let mut map = HashMap::new();

        map.insert("0-0:1.0.0", FieldSlot::MeterTimestamp);
        map.insert("1-0:1.8.1", FieldSlot::EnergyImportT1);
        map.insert("1-0:1.8.2", FieldSlot::EnergyImportT2);
        map.insert("1-0:1.7.0", FieldSlot::ActivePower);
        map.insert("0-1:24.2.1", FieldSlot::GasRegister);

        map
    };
}

/// Every mandatory field, present. Timestamps are still the raw compact
/// strings; normalization happens after mapping.
#[derive(Debug, PartialEq)]
pub struct MappedFields {
    pub timestamp: String,
    pub t1: Measurement,
    pub t2: Measurement,
    pub active: Measurement,
    pub gas_timestamp: String,
    pub gas_value: Measurement,
}

pub fn map_fields(lines: &[ObisLine]) -> Result<MappedFields, ParseError> {
    let mut timestamp = None;
    let mut t1 = None;
    let mut t2 = None;
    let mut active = None;
    let mut gas_timestamp = None;
    let mut gas_value = None;

    for line in lines {
        match FIELD_TABLE.get(line.code.as_str()) {
            Some(FieldSlot::MeterTimestamp) => timestamp = line.raw_timestamp.clone(),
            Some(FieldSlot::EnergyImportT1) => t1 = line.values.first().cloned(),
            Some(FieldSlot::EnergyImportT2) => t2 = line.values.first().cloned(),
            Some(FieldSlot::ActivePower) => active = line.values.first().cloned(),
            Some(FieldSlot::GasRegister) => {
                // Timestamp group and value group contribute independently
                if line.raw_timestamp.is_some() {
                    gas_timestamp = line.raw_timestamp.clone();
                }
                if let Some(value) = line.values.first() {
                    gas_value = Some(value.clone());
                }
            }
            None => debug!("Ignoring unmapped OBIS code {}", line.code),
        }
    }

    // Collect the complete set of absent fields so the caller sees every
    // problem in one failure.
    let mut missing = Vec::new();
    if timestamp.is_none() { missing.push("timestamp"); }
    if t1.is_none() { missing.push("power.import.t1"); }
    if t2.is_none() { missing.push("power.import.t2"); }
    if active.is_none() { missing.push("power.import.active"); }
    if gas_timestamp.is_none() { missing.push("gas.timestamp"); }
    if gas_value.is_none() { missing.push("gas.value"); }

    match (timestamp, t1, t2, active, gas_timestamp, gas_value) {
        (Some(timestamp), Some(t1), Some(t2), Some(active), Some(gas_timestamp), Some(gas_value)) => {
            Ok(MappedFields { timestamp, t1, t2, active, gas_timestamp, gas_value })
        }
        _ => Err(ParseError::MissingRequiredField(
            missing.iter().map(|name| name.to_string()).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::obis::parse_line;

    fn lines(raw: &[&str]) -> Vec<ObisLine> {
        raw.iter()
            .filter_map(|line| parse_line(line).unwrap())
            .collect()
    }

    #[test]
    fn test_map_complete_set() {
        let fields = map_fields(&lines(&[
            "0-0:1.0.0(230615120000S)",
            "1-0:1.8.1(001234.567*kWh)",
            "1-0:1.8.2(002345.678*kWh)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(230615110000S)(01234.567*m3)",
        ])).unwrap();

        assert_eq!(fields.timestamp, "230615120000S");
        assert_eq!(fields.t1.value, 1234.567);
        assert_eq!(fields.t2.value, 2345.678);
        assert_eq!(fields.active.unit, "kW");
        assert_eq!(fields.gas_timestamp, "230615110000S");
        assert_eq!(fields.gas_value.unit, "m3");
    }

    #[test]
    fn test_unmapped_codes_are_ignored() {
        let fields = map_fields(&lines(&[
            "0-0:1.0.0(230615120000S)",
            "1-0:1.8.1(001234.567*kWh)",
            "1-0:1.8.2(002345.678*kWh)",
            "1-0:2.8.1(000011.000*kWh)",
            "1-0:1.7.0(00.345*kW)",
            "0-1:24.2.1(230615110000S)(01234.567*m3)",
        ]));
        assert!(fields.is_ok());
    }

    #[test]
    fn test_all_missing_fields_named_at_once() {
        match map_fields(&lines(&["1-0:1.8.1(001234.567*kWh)"])) {
            Err(ParseError::MissingRequiredField(missing)) => {
                assert_eq!(missing, vec![
                    "timestamp".to_string(),
                    "power.import.t2".to_string(),
                    "power.import.active".to_string(),
                    "gas.timestamp".to_string(),
                    "gas.value".to_string(),
                ]);
            }
            other => panic!("expected missing field error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_names_every_field() {
        match map_fields(&[]) {
            Err(ParseError::MissingRequiredField(missing)) => assert_eq!(missing.len(), 6),
            other => panic!("expected missing field error, got {:?}", other),
        }
    }
}
