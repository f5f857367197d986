use crc16::{State, ARC};
use log::debug;
use super::tokenizer::TelegramFrame;
use super::ParseError;

/// CRC-16/ARC (polynomial 0xA001 reflected, initial value 0x0000), the
/// checksum the P1 companion standard prescribes for telegrams.
pub fn compute(span: &[u8]) -> u16 {
    State::<ARC>::calculate(span)
}

/// Hard gate: no data line is interpreted when the frame CRC disagrees
/// with the declared checksum, because a corrupted frame cannot be
/// assumed to parse safely even if individual lines look well-formed.
pub fn verify(frame: &TelegramFrame) -> Result<(), ParseError> {
    let computed = compute(frame.span);

    debug!("P1 checksum: declared=0x{:04X}, computed=0x{:04X}",
           frame.declared_checksum, computed);

    if computed != frame.declared_checksum {
        return Err(ParseError::ChecksumMismatch {
            declared: format!("{:04X}", frame.declared_checksum),
            computed: format!("{:04X}", computed),
        });
    }
    Ok(())
}
