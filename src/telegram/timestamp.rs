use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use super::ParseError;

/// Turn a compact meter timestamp `YYMMDDhhmmssX` into a UTC instant.
///
/// The digit fields are a civil date-time in the meter's home zone. The
/// trailing indicator says whether the meter clock was on summer (`S`) or
/// winter (`W`) time when it rendered them, and that flag alone selects
/// the UTC offset. Recomputing DST from the date would misread transition
/// hours: the repeated hour of the autumn change is ambiguous and the
/// skipped hour of the spring change does not exist in the zone, while
/// the meter has already resolved both at the source.
pub fn normalize_timestamp(compact: &str, home_tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    let invalid = |reason: &str| {
        ParseError::InvalidTimestamp(compact.to_string(), reason.to_string())
    };

    if compact.len() != 13 || !compact.is_char_boundary(12) {
        return Err(invalid("expected 12 digits and a DST indicator"));
    }
    let (digits, indicator) = compact.split_at(12);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("non-digit in date fields"));
    }

    let summer = match indicator {
        "S" => true,
        "W" => false,
        _ => return Err(invalid("DST indicator must be S or W")),
    };

    let field = |from: usize, to: usize| {
        digits[from..to].parse::<u32>().map_err(|_| invalid("non-digit in date fields"))
    };
    let year = 2000 + field(0, 2)? as i32;
    let (month, day) = (field(2, 4)?, field(4, 6)?);
    let (hour, minute, second) = (field(6, 8)?, field(8, 10)?, field(10, 12)?);

    let civil = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| invalid("not a calendar-valid date/time"))?;

    // Probe the zone six months apart so both the standard offset and the
    // DST shift are known regardless of the season the timestamp falls in.
    let near = home_tz.offset_from_utc_datetime(&civil);
    let opposite = home_tz.offset_from_utc_datetime(&(civil + Duration::days(182)));
    let standard = near.base_utc_offset();
    let dst_shift = std::cmp::max(near.dst_offset(), opposite.dst_offset());

    let utc_offset = if summer { standard + dst_shift } else { standard };
    Ok(Utc.from_utc_datetime(&(civil - utc_offset)))
}
