use std::io::{self, Write};

/// Largest value a four-byte variable-length quantity can carry
pub const MAX_VARLEN: u32 = 0x0FFF_FFFF;

/// Writes `value` as a MIDI variable-length quantity.
///
/// Groups of seven bits are written most significant first; every group but
/// the last has bit 7 set. Zero is written as a single `00` byte. Returns the
/// number of bytes written.
pub fn write_varlen<W: Write>(out: &mut W, mut value: u32) -> io::Result<usize> {
    let mut buf = [0u8; 5];
    let mut pos = buf.len() - 1;

    buf[pos] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        pos -= 1;
        buf[pos] = 0x80 | (value & 0x7F) as u8;
        value >>= 7;
    }

    out.write_all(&buf[pos..])?;
    Ok(buf.len() - pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        let written = write_varlen(&mut out, value).unwrap();
        assert_eq!(written, out.len());
        out
    }

    #[test]
    fn test_zero_is_one_byte() {
        assert_eq!(encode(0), vec![0x00]);
    }

    #[test]
    fn test_group_boundaries() {
        assert_eq!(encode(0x40), vec![0x40]);
        assert_eq!(encode(0x7F), vec![0x7F]);
        assert_eq!(encode(0x80), vec![0x81, 0x00]);
        assert_eq!(encode(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encode(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encode(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encode(0x1F_FFFF), vec![0xFF, 0xFF, 0x7F]);
        assert_eq!(encode(0x20_0000), vec![0x81, 0x80, 0x80, 0x00]);
        assert_eq!(encode(MAX_VARLEN), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_values_past_four_bytes_still_encode() {
        assert_eq!(encode(u32::MAX), vec![0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_one_second_at_wire_resolution() {
        // 31250 = 0b1_1110100_0010010
        assert_eq!(encode(31_250), vec![0x81, 0xF4, 0x12]);
    }
}
