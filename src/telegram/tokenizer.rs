use super::ParseError;

/// A telegram split into its transport parts: the identification line,
/// the data lines between header and footer, the exact byte span the CRC
/// covers (start marker through end marker inclusive) and the checksum
/// the meter declared after the end marker.
#[derive(Debug, PartialEq)]
pub struct TelegramFrame<'a> {
    pub identification: &'a str,
    pub lines: Vec<&'a str>,
    pub span: &'a [u8],
    pub declared_checksum: u16,
}

pub fn tokenize(raw: &str) -> Result<TelegramFrame<'_>, ParseError> {
    let start = raw.find('/')
        .ok_or(ParseError::MalformedFrame("no start marker"))?;
    let end = raw.find('!')
        .ok_or(ParseError::MalformedFrame("no end marker"))?;
    if end < start {
        return Err(ParseError::MalformedFrame("end marker precedes start marker"));
    }

    let body = &raw[start..end];
    if body[1..].contains('/') {
        return Err(ParseError::MalformedFrame("more than one start marker"));
    }
    if raw[end + 1..].contains('!') {
        return Err(ParseError::MalformedFrame("more than one end marker"));
    }

    // The checksum is the remainder of the footer line, 4 hex digits.
    let checksum_text = raw[end + 1..].lines().next().unwrap_or("");
    if checksum_text.len() != 4 || !checksum_text.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::TruncatedFrame("checksum missing or not 4 hex digits"));
    }
    let declared_checksum = u16::from_str_radix(checksum_text, 16)
        .map_err(|_| ParseError::TruncatedFrame("checksum missing or not 4 hex digits"))?;

    let mut body_lines = body.lines();
    let identification = body_lines.next().unwrap_or("");
    let lines: Vec<&str> = body_lines.filter(|line| !line.trim().is_empty()).collect();

    Ok(TelegramFrame {
        identification,
        lines,
        span: &raw.as_bytes()[start..=end],
        declared_checksum,
    })
}
