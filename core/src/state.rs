use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT, FONT_START, KEY_COUNT, MEMORY_SIZE, PROGRAM_START,
    REGISTER_COUNT, STACK_SIZE,
};
use crate::errors::Fault;

/// The FrameBuffer is indexed as [y][x]; `true` is a lit pixel
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// Pressed status of keys 0..F
pub type Keypad = [bool; KEY_COUNT];

/// A snapshot of the Chip-8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the flag register
/// - (i) a 16-bit index register, only the low 12 bits of which can address memory
///
/// Counter
/// - (pc) a 16-bit program counter pointing at the next instruction to fetch
///
/// Pointer
/// - (sp) the number of occupied stack slots, 0..=16
///
/// Timers
/// - 2 8-bit countdown timers (delay & sound)
///
/// ## Memory
/// - 16 slot stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x050..0x0A0 holds the hexadecimal font
///     - 0x200.. holds the program image
/// - 64x32 frame buffer
///
/// Copying a State is how instructions are applied: every handler builds the next State
/// from the previous one, so a faulting instruction leaves nothing half-written.
#[derive(Copy, Clone)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    /// The most recently fetched instruction word
    pub opcode: u16,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font_start = FONT_START as usize;
        memory[font_start..font_start + FONT.len()].copy_from_slice(&FONT);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            opcode: 0,
        }
    }

    /// Address of the instruction being executed.
    /// Handlers run after the fetch has already moved `pc` past it.
    fn instruction_address(&self) -> u16 {
        self.pc.wrapping_sub(2)
    }

    pub fn out_of_range(&self, address: usize) -> Fault {
        Fault::AddressOutOfRange {
            address,
            pc: self.instruction_address(),
        }
    }

    pub fn misaligned(&self, address: u16) -> Fault {
        Fault::MisalignedAddress {
            address,
            pc: self.instruction_address(),
        }
    }

    /// Borrow `len` bytes of memory starting at `addr`
    pub fn read(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        let start = addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(self.out_of_range(end - 1));
        }
        Ok(&self.memory[start..end])
    }

    /// Copy `bytes` into memory starting at `addr`
    pub fn write(&mut self, addr: u16, bytes: &[u8]) -> Result<(), Fault> {
        let start = addr as usize;
        let end = start + bytes.len();
        if end > MEMORY_SIZE {
            return Err(self.out_of_range(end - 1));
        }
        self.memory[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Store a return address and bump the stack pointer
    pub fn push(&mut self, addr: u16) -> Result<(), Fault> {
        let sp = self.sp as usize;
        if sp >= STACK_SIZE {
            return Err(Fault::StackOverflow {
                pc: self.instruction_address(),
            });
        }
        self.stack[sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Drop the stack pointer and return the address it pointed at
    pub fn pop(&mut self) -> Result<u16, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow {
                pc: self.instruction_address(),
            });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp as usize])
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_installs_font() {
        let state = State::new();
        assert_eq!(state.memory[0x50..0xA0], FONT[..]);
        assert!(state.memory[..0x50].iter().all(|&b| b == 0));
        assert!(state.memory[0xA0..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_new_starts_at_program_origin() {
        let state = State::new();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert_eq!(state.i, 0);
    }

    #[test]
    fn test_read_last_byte() {
        let mut state = State::new();
        state.memory[0xFFF] = 0xAB;
        assert_eq!(state.read(0xFFF, 1), Ok(&[0xAB][..]));
    }

    #[test]
    fn test_read_past_end_faults() {
        let mut state = State::new();
        state.pc = 0x302;
        assert_eq!(
            state.read(0xFFE, 3),
            Err(Fault::AddressOutOfRange {
                address: 0x1000,
                pc: 0x300
            })
        );
    }

    #[test]
    fn test_write_past_end_leaves_memory() {
        let mut state = State::new();
        assert!(state.write(0xFFF, &[1, 2]).is_err());
        assert_eq!(state.memory[0xFFF], 0);
    }

    #[test]
    fn test_push_pop() {
        let mut state = State::new();
        state.push(0x0ABC).unwrap();
        assert_eq!(state.sp, 1);
        assert_eq!(state.stack[0], 0x0ABC);
        assert_eq!(state.pop(), Ok(0x0ABC));
        assert_eq!(state.sp, 0);
    }

    #[test]
    fn test_push_full_stack_faults() {
        let mut state = State::new();
        for addr in 0..16 {
            state.push(addr).unwrap();
        }
        state.pc = 0x212;
        assert_eq!(state.push(0x1), Err(Fault::StackOverflow { pc: 0x210 }));
        assert_eq!(state.sp, 16);
    }

    #[test]
    fn test_pop_empty_stack_faults() {
        let mut state = State::new();
        assert_eq!(state.pop(), Err(Fault::StackUnderflow { pc: 0x1FE }));
    }
}
