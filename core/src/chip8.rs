use std::io::{self, Read};

use log::{debug, error, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::constants::{KEY_COUNT, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START};
use crate::errors::{Chip8Error, Fault};
use crate::instruction::{Instruction, Machine};
use crate::opcode::Opcode;
use crate::random::RandomSource;
use crate::state::{FrameBuffer, Keypad, State};

/// Counters kept for the host's benefit; they never influence execution
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Instructions executed, including unrecognized ones
    pub cycles: u64,
    /// Words fetched that decode to no instruction
    pub unrecognized: u64,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - `pressed_keys` with public interfaces for manipulating them
///  - the source of random bytes, `StdRng` unless the host supplies another
///  - the first `fault` raised by the running program, which halts it
///
/// Supplies interfaces for:
/// - loading program images
/// - pressing and releasing keys
/// - advancing the CPU and, separately, its timers
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8<R = StdRng> {
    state: State,
    pressed_keys: Keypad,
    rng: R,
    config: Config,
    fault: Option<Fault>,
    diagnostics: Diagnostics,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: RandomSource> Chip8<R> {
    /// Use `rng` for `RND`; hand in a seeded or scripted source for repeatable runs
    pub fn with_rng(config: Config, rng: R) -> Self {
        Chip8 {
            state: State::new(),
            pressed_keys: [false; KEY_COUNT],
            rng,
            config,
            fault: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Hard reset: memory, registers, stack, timers, keys and frame buffer are cleared,
    /// the font is reinstalled and pc returns to the program origin.
    /// Any recorded fault is forgotten; the random source and config are kept.
    pub fn initialize(&mut self) {
        self.state = State::new();
        self.pressed_keys = [false; KEY_COUNT];
        self.fault = None;
        self.diagnostics = Diagnostics::default();
        debug!("initialized; pc={:#06X}", self.state.pc);
    }

    /// Copy a program image into memory at the program origin.
    /// An image too large to fit is rejected without touching memory.
    ///
    /// # Arguments
    /// * `rom` the raw program image
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte program at {:#06X}", rom.len(), start);
        Ok(())
    }

    /// Load a program image from some source
    ///
    /// # Arguments
    /// * `reader` e.g. a file containing a ROM
    pub fn load_rom_from(&mut self, reader: &mut dyn Read) -> Result<(), Chip8Error> {
        let mut buffer = [0; MAX_PROGRAM_SIZE];
        let mut len = 0;
        while len < buffer.len() {
            match reader.read(&mut buffer[len..]) {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        // A full buffer may still have more behind it; measure the rest to report the size
        if len == buffer.len() {
            let rest = io::copy(reader, &mut io::sink())? as usize;
            if rest > 0 {
                return Err(Chip8Error::RomTooLarge {
                    size: len + rest,
                    max_size: MAX_PROGRAM_SIZE,
                });
            }
        }
        self.load_rom(&buffer[..len])
    }

    /// Returns the FrameBuffer if it has changed since the last call
    pub fn get_frame(&mut self) -> Option<&FrameBuffer> {
        if std::mem::take(&mut self.state.draw_flag) {
            Some(&self.state.frame_buffer)
        } else {
            None
        }
    }

    /// The FrameBuffer as it stands, changed or not
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit number of the key that was pressed
    pub fn key_press(&mut self, key: u8) -> Result<(), Chip8Error> {
        self.set_key(key, true)
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit number of the key that was released
    pub fn key_release(&mut self, key: u8) -> Result<(), Chip8Error> {
        self.set_key(key, false)
    }

    /// Replace the pressed status of every key at once
    pub fn set_keys(&mut self, keys: Keypad) {
        self.pressed_keys = keys;
    }

    fn set_key(&mut self, key: u8, pressed: bool) -> Result<(), Chip8Error> {
        let slot = self
            .pressed_keys
            .get_mut(key as usize)
            .ok_or(Chip8Error::InvalidKey(key))?;
        *slot = pressed;
        Ok(())
    }

    /// Advances the CPU by a single cycle
    /// - fetches the opcode at pc and moves pc past it
    /// - decodes and executes it
    /// - ticks the timers, unless the host drives them itself
    ///
    /// A fault leaves the state as it was before the cycle and stops all further cycles
    /// until `initialize` is called.
    pub fn step(&mut self) -> Result<Instruction, Chip8Error> {
        if let Some(fault) = self.fault {
            return Err(Chip8Error::Halted(fault));
        }

        match self.execute_cycle() {
            Ok(instruction) => {
                if self.config.timers_in_step {
                    self.tick_timers();
                }
                Ok(instruction)
            }
            Err(fault) => {
                error!("{}", fault);
                self.fault = Some(fault);
                Err(fault.into())
            }
        }
    }

    fn execute_cycle(&mut self) -> Result<Instruction, Fault> {
        let op = Opcode::fetch(&self.state)?;
        let instruction = Instruction::from(op);
        trace!(
            "{:04X} {:04X} {:<16} v{:02X?} i{:04X}",
            self.state.pc,
            op.0,
            instruction.to_string(),
            self.state.v,
            self.state.i
        );

        let mut fetched = self.state;
        fetched.opcode = op.0;
        fetched.pc += 0x2;

        let mut machine = Machine {
            keys: &self.pressed_keys,
            rng: &mut self.rng,
            quirks: self.config.quirks,
        };
        let next = instruction.execute(&fetched, &mut machine)?;
        // Falling through or skipping off the end leaves no instruction to fetch
        if next.pc as usize > MEMORY_SIZE - 2 {
            return Err(Fault::AddressOutOfRange {
                address: next.pc as usize,
                pc: self.state.pc,
            });
        }

        if let Instruction::Unrecognized(word) = instruction {
            warn!(
                "ignoring unrecognized instruction {:04X} at {:04X}",
                word, self.state.pc
            );
            self.diagnostics.unrecognized += 1;
        }
        self.diagnostics.cycles += 1;
        self.state = next;
        Ok(instruction)
    }

    /// Decrements each nonzero timer by one.
    /// Meant to be called at 60Hz when `Config::timers_in_step` is off.
    pub fn tick_timers(&mut self) {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }

        if self.state.sound_timer > 0 {
            self.state.sound_timer -= 1;
        }
    }

    pub fn registers(&self) -> &[u8] {
        &self.state.v
    }

    pub fn index(&self) -> u16 {
        self.state.i
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn sp(&self) -> u8 {
        self.state.sp
    }

    /// The word most recently fetched
    pub fn opcode(&self) -> u16 {
        self.state.opcode
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// The tone should sound for as long as the sound timer is running
    pub fn is_sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.state.memory
    }

    pub fn keys(&self) -> &Keypad {
        &self.pressed_keys
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quirks;
    use crate::random::ByteSequence;

    fn chip8_with(program: &[u8]) -> Chip8<ByteSequence<1>> {
        let mut chip8 = Chip8::with_rng(Config::default(), ByteSequence::new([0x5A]));
        chip8.load_rom(program).unwrap();
        chip8
    }

    #[test]
    fn test_step_advances_pc() {
        let mut chip8 = chip8_with(&[0x00, 0xE0]);
        let starting_pc = chip8.pc();
        assert_eq!(chip8.step().unwrap(), Instruction::Clear);
        assert_eq!(chip8.pc(), starting_pc + 0x2);
        assert_eq!(chip8.opcode(), 0x00E0);
    }

    #[test]
    fn test_step_ticks_timers() {
        let mut chip8 = chip8_with(&[0x60, 0x05, 0xF0, 0x15, 0xF1, 0x07]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        // set to 5 by the second instruction, then ticked once
        assert_eq!(chip8.delay_timer(), 4);
        chip8.step().unwrap();
        assert_eq!(chip8.registers()[0x1], 4);
        assert_eq!(chip8.delay_timer(), 3);
    }

    #[test]
    fn test_decoupled_timers_only_tick_on_request() {
        let config = Config {
            timers_in_step: false,
            ..Config::default()
        };
        let mut chip8 = Chip8::with_rng(config, ByteSequence::new([]));
        chip8.load_rom(&[0x60, 0x05, 0xF0, 0x18, 0x12, 0x04]).unwrap();
        chip8.step().unwrap();
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.sound_timer(), 5);
        assert!(chip8.is_sound_active());
        chip8.tick_timers();
        assert_eq!(chip8.sound_timer(), 4);
    }

    #[test]
    fn test_unrecognized_counted() {
        let mut chip8 = chip8_with(&[0x01, 0x23, 0xFF, 0xFF]);
        assert_eq!(chip8.step().unwrap(), Instruction::Unrecognized(0x0123));
        assert_eq!(chip8.step().unwrap(), Instruction::Unrecognized(0xFFFF));
        assert_eq!(chip8.pc(), 0x204);
        assert_eq!(
            chip8.diagnostics(),
            Diagnostics {
                cycles: 2,
                unrecognized: 2
            }
        );
    }

    #[test]
    fn test_random_uses_injected_source() {
        let mut chip8 = chip8_with(&[0xC3, 0xF0]);
        chip8.step().unwrap();
        assert_eq!(chip8.registers()[0x3], 0x50);
    }

    #[test]
    fn test_captures_key_presses() {
        let mut chip8 = Chip8::new();
        chip8.key_press(0xE).unwrap();
        assert!(chip8.keys()[0xE]);
        chip8.key_release(0xE).unwrap();
        assert!(!chip8.keys()[0xE]);
    }

    #[test]
    fn test_rejects_missing_keys() {
        let mut chip8 = Chip8::new();
        assert!(matches!(
            chip8.key_press(0x10),
            Err(Chip8Error::InvalidKey(0x10))
        ));
    }

    #[test]
    fn test_waits_for_key() {
        // LD V1, K
        let mut chip8 = chip8_with(&[0xF1, 0x0A]);
        for _ in 0..3 {
            chip8.step().unwrap();
            assert_eq!(chip8.pc(), 0x200);
        }
        chip8.key_press(0x7).unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.registers()[0x1], 0x7);
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn test_fault_halts() {
        // RET with nothing on the stack
        let mut chip8 = chip8_with(&[0x00, 0xEE]);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::Fault(Fault::StackUnderflow { pc: 0x200 }))
        ));
        assert_eq!(chip8.pc(), 0x200);
        assert!(matches!(chip8.step(), Err(Chip8Error::Halted(_))));
        assert_eq!(chip8.diagnostics().cycles, 0);
    }

    #[test]
    fn test_fault_leaves_timers() {
        let mut chip8 = chip8_with(&[0x60, 0x09, 0xF0, 0x15, 0x00, 0xEE]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.delay_timer(), 8);
        assert!(chip8.step().is_err());
        assert_eq!(chip8.delay_timer(), 8);
    }

    /// A full-size image: `head` at the program origin and `tail` ending at 0xFFF
    fn chip8_spanning(head: &[u8], tail: &[u8]) -> Chip8<ByteSequence<1>> {
        let mut rom = vec![0x00; MAX_PROGRAM_SIZE];
        rom[..head.len()].copy_from_slice(head);
        rom[MAX_PROGRAM_SIZE - tail.len()..].copy_from_slice(tail);
        chip8_with(&rom)
    }

    #[test]
    fn test_jump_to_last_byte_faults() {
        // JP 0xFFF: the last byte can't hold a whole instruction
        let mut chip8 = chip8_with(&[0x1F, 0xFF]);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::Fault(Fault::AddressOutOfRange {
                address: 0xFFF,
                pc: 0x200
            }))
        ));
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn test_odd_jump_faults() {
        let mut chip8 = chip8_with(&[0x12, 0x03]);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::Fault(Fault::MisalignedAddress {
                address: 0x203,
                pc: 0x200
            }))
        ));
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn test_skip_off_end_faults() {
        // JP 0xFFC; 0xFFC SE V0, 0x00; 0xFFE JP 0x200
        let mut chip8 = chip8_spanning(&[0x1F, 0xFC], &[0x30, 0x00, 0x12, 0x00]);
        chip8.step().unwrap();
        assert_eq!(chip8.pc(), 0xFFC);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::Fault(Fault::AddressOutOfRange {
                address: 0x1000,
                pc: 0xFFC
            }))
        ));
        assert_eq!(chip8.pc(), 0xFFC);
    }

    #[test]
    fn test_last_instruction_falling_off_end_faults() {
        // JP 0xFFE; 0xFFE LD V0, 0x01
        let mut chip8 = chip8_spanning(&[0x1F, 0xFE], &[0x60, 0x01]);
        chip8.step().unwrap();
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::Fault(Fault::AddressOutOfRange {
                address: 0x1000,
                pc: 0xFFE
            }))
        ));
        assert_eq!(chip8.registers()[0x0], 0x00);
        assert_eq!(chip8.pc(), 0xFFE);
    }

    #[test]
    fn test_last_instruction_may_jump_away() {
        // JP 0xFFE; 0xFFE JP 0x200
        let mut chip8 = chip8_spanning(&[0x1F, 0xFE], &[0x12, 0x00]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn test_return_past_memory_faults() {
        // JP 0xFFE; 0x202 RET; 0xFFE CALL 0x202, which pushes 0x1000
        let mut chip8 = chip8_spanning(&[0x1F, 0xFE, 0x00, 0xEE], &[0x22, 0x02]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.pc(), 0x202);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::Fault(Fault::AddressOutOfRange {
                address: 0x1000,
                pc: 0x202
            }))
        ));
    }

    #[test]
    fn test_initialize_resets() {
        let mut chip8 = chip8_with(&[0x00, 0xEE]);
        chip8.key_press(0x1).unwrap();
        let _ = chip8.step();
        chip8.initialize();
        assert_eq!(chip8.fault(), None);
        assert_eq!(chip8.pc(), 0x200);
        assert!(!chip8.keys()[0x1]);
        assert_eq!(chip8.memory()[0x200..0x202], [0x00, 0x00]);
        assert_eq!(chip8.memory()[0x50], 0xF0);
        chip8.initialize();
        assert_eq!(chip8.memory()[0x50..0xA0], crate::constants::FONT[..]);
    }

    #[test]
    fn test_get_frame_only_when_changed() {
        let mut chip8 = chip8_with(&[0x00, 0xE0, 0x60, 0x01]);
        assert!(chip8.get_frame().is_none());
        chip8.step().unwrap();
        assert!(chip8.get_frame().is_some());
        assert!(chip8.get_frame().is_none());
        chip8.step().unwrap();
        assert!(chip8.get_frame().is_none());
    }

    #[test]
    fn test_load_rom_from_reader() {
        let mut chip8 = Chip8::new();
        let mut rom: &[u8] = &[0xA2, 0x2A, 0x60, 0x0C];
        chip8.load_rom_from(&mut rom).unwrap();
        assert_eq!(chip8.memory()[0x200..0x204], [0xA2, 0x2A, 0x60, 0x0C]);
    }

    #[test]
    fn test_load_rom_from_reader_too_large() {
        let mut chip8 = Chip8::new();
        let image = vec![0xAA; MAX_PROGRAM_SIZE + 10];
        let mut rom: &[u8] = &image;
        assert!(matches!(
            chip8.load_rom_from(&mut rom),
            Err(Chip8Error::RomTooLarge {
                size,
                max_size: MAX_PROGRAM_SIZE
            }) if size == MAX_PROGRAM_SIZE + 10
        ));
        assert!(chip8.memory()[0x200..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_shift_quirk_from_config() {
        let config = Config {
            quirks: Quirks {
                shift_reads_vy: true,
                ..Quirks::default()
            },
            ..Config::default()
        };
        let mut chip8 = Chip8::with_rng(config, ByteSequence::new([]));
        // V2 = 0x81; SHL V1, V2
        chip8.load_rom(&[0x62, 0x81, 0x81, 0x2E]).unwrap();
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.registers()[0x1], 0x02);
        assert_eq!(chip8.registers()[0xF], 0x01);
    }
}
