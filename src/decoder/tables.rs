/// Data byte count for messages that run until a terminator or a new status
pub const VARIABLE: u32 = u32::MAX;

/// Data bytes following a channel voice status, indexed by the high nibble (0x8-0xF)
const CHANNEL_DATA_BYTES: [u32; 8] = [
    2,        // 8x note off
    2,        // 9x note on
    2,        // Ax poly pressure
    2,        // Bx control change
    1,        // Cx program change
    1,        // Dx channel pressure
    2,        // Ex pitch bend
    VARIABLE, // Fx system
];

/// Data bytes following a system status, indexed by the low nibble (0xF0-0xFF)
const SYSTEM_DATA_BYTES: [u32; 16] = [
    VARIABLE, // F0 sysex start
    1,        // F1 time code quarter frame
    2,        // F2 song position
    1,        // F3 song select
    0,        // F4 undefined
    0,        // F5 undefined
    0,        // F6 tune request
    VARIABLE, // F7 sysex end / escape
    0,        // F8 timing clock
    1,        // F9 undefined
    0,        // FA start
    0,        // FB continue
    0,        // FC stop
    0,        // FD undefined
    0,        // FE active sensing
    0,        // FF reset
];

/// Number of data bytes expected after `status`.
pub fn data_bytes(status: u8) -> u32 {
    if status < 0xF0 {
        CHANNEL_DATA_BYTES[usize::from((status >> 4) & 0x07)]
    } else {
        SYSTEM_DATA_BYTES[usize::from(status & 0x0F)]
    }
}

pub fn is_status(byte: u8) -> bool {
    byte & 0x80 != 0
}

pub fn is_sysex(status: u8) -> bool {
    status == 0xF0 || status == 0xF7
}

/// System messages that have no representation in a MIDI file
pub fn is_unrepresentable(status: u8) -> bool {
    (0xF1..=0xFE).contains(&status) && status != 0xF7
}
