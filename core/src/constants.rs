/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// Where program images are loaded and where execution begins
pub const PROGRAM_START: u16 = 0x200;

/// The largest program image that fits between `PROGRAM_START` and the end of memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Where the hexadecimal font is installed
pub const FONT_START: u16 = 0x50;

/// Each glyph is 5 rows tall
pub const GLYPH_SIZE: u16 = 5;

pub const REGISTER_COUNT: usize = 16;

/// VF doubles as the carry, borrow, shift-out and collision flag
pub const FLAG: usize = 0xF;

pub const STACK_SIZE: usize = 16;

pub const KEY_COUNT: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Nanoseconds per CPU cycle at the conventional 500Hz
pub const CLOCK_SPEED: u64 = 2_000_000;

/// The delay and sound timers count down at 60Hz
pub const TIMER_HZ: u64 = 60;

/// # Font
/// Glyphs for the hexadecimal digits 0..F.
///
/// Each glyph is 4 pixels wide and 5 rows tall; only the high nibble of each byte is lit.
/// ```text
/// 0xF0  ####
/// 0x90  #  #
/// 0x90  #  #
/// 0x90  #  #
/// 0xF0  ####
/// ```
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
