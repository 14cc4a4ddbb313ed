use std::fmt;

use crate::config::Quirks;
use crate::errors::Fault;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::random::RandomSource;
use crate::state::{Keypad, State};

/// A decoded instruction, carrying only the operands it uses.
///
/// `x` and `y` are register numbers, `nn` and `mask` are 8-bit immediates and `addr` is a
/// 12-bit address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Clear,
    Return,
    Jump { addr: u16 },
    Call { addr: u16 },
    SkipEqImm { x: u8, nn: u8 },
    SkipNeImm { x: u8, nn: u8 },
    SkipEqReg { x: u8, y: u8 },
    LoadImm { x: u8, nn: u8 },
    AddImm { x: u8, nn: u8 },
    Move { x: u8, y: u8 },
    Or { x: u8, y: u8 },
    And { x: u8, y: u8 },
    Xor { x: u8, y: u8 },
    AddReg { x: u8, y: u8 },
    Sub { x: u8, y: u8 },
    ShiftRight { x: u8, y: u8 },
    SubReverse { x: u8, y: u8 },
    ShiftLeft { x: u8, y: u8 },
    SkipNeReg { x: u8, y: u8 },
    LoadIndex { addr: u16 },
    JumpOffset { addr: u16 },
    Random { x: u8, mask: u8 },
    Draw { x: u8, y: u8, height: u8 },
    SkipKeyPressed { x: u8 },
    SkipKeyReleased { x: u8 },
    LoadDelay { x: u8 },
    WaitKey { x: u8 },
    SetDelay { x: u8 },
    SetSound { x: u8 },
    AddIndex { x: u8 },
    LoadGlyph { x: u8 },
    StoreBcd { x: u8 },
    StoreRegisters { x: u8 },
    LoadRegisters { x: u8 },
    /// A word that names no instruction; executing it does nothing
    Unrecognized(u16),
}

/// What an instruction may consult besides the State it transforms
pub struct Machine<'a> {
    pub keys: &'a Keypad,
    pub rng: &'a mut dyn RandomSource,
    pub quirks: Quirks,
}

impl From<Opcode> for Instruction {
    fn from(op: Opcode) -> Self {
        use Instruction::*;

        let (x, y, nn, addr) = (op.x(), op.y(), op.nn(), op.nnn());
        match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Clear,
            (0x0, 0x0, 0xE, 0xE) => Return,
            (0x1, ..) => Jump { addr },
            (0x2, ..) => Call { addr },
            (0x3, ..) => SkipEqImm { x, nn },
            (0x4, ..) => SkipNeImm { x, nn },
            (0x5, .., 0x0) => SkipEqReg { x, y },
            (0x6, ..) => LoadImm { x, nn },
            (0x7, ..) => AddImm { x, nn },
            (0x8, .., 0x0) => Move { x, y },
            (0x8, .., 0x1) => Or { x, y },
            (0x8, .., 0x2) => And { x, y },
            (0x8, .., 0x3) => Xor { x, y },
            (0x8, .., 0x4) => AddReg { x, y },
            (0x8, .., 0x5) => Sub { x, y },
            (0x8, .., 0x6) => ShiftRight { x, y },
            (0x8, .., 0x7) => SubReverse { x, y },
            (0x8, .., 0xE) => ShiftLeft { x, y },
            (0x9, .., 0x0) => SkipNeReg { x, y },
            (0xA, ..) => LoadIndex { addr },
            (0xB, ..) => JumpOffset { addr },
            (0xC, ..) => Random { x, mask: nn },
            (0xD, _, _, n) => Draw { x, y, height: n },
            (0xE, _, 0x9, 0xE) => SkipKeyPressed { x },
            (0xE, _, 0xA, 0x1) => SkipKeyReleased { x },
            (0xF, _, 0x0, 0x7) => LoadDelay { x },
            (0xF, _, 0x0, 0xA) => WaitKey { x },
            (0xF, _, 0x1, 0x5) => SetDelay { x },
            (0xF, _, 0x1, 0x8) => SetSound { x },
            (0xF, _, 0x1, 0xE) => AddIndex { x },
            (0xF, _, 0x2, 0x9) => LoadGlyph { x },
            (0xF, _, 0x3, 0x3) => StoreBcd { x },
            (0xF, _, 0x5, 0x5) => StoreRegisters { x },
            (0xF, _, 0x6, 0x5) => LoadRegisters { x },
            _ => Unrecognized(op.0),
        }
    }
}

impl Instruction {
    /// Applies this instruction to `state`, producing the next State.
    ///
    /// Expects `state.pc` to already point past this instruction.
    pub(crate) fn execute(
        self,
        state: &State,
        machine: &mut Machine,
    ) -> Result<State, Fault> {
        use Instruction::*;

        let quirks = machine.quirks;
        match self {
            Clear => clear(state),
            Return => ret(state),
            Jump { addr } => jump(state, addr),
            Call { addr } => call(state, addr),
            SkipEqImm { x, nn } => skip_eq_imm(state, x, nn),
            SkipNeImm { x, nn } => skip_ne_imm(state, x, nn),
            SkipEqReg { x, y } => skip_eq_reg(state, x, y),
            LoadImm { x, nn } => load_imm(state, x, nn),
            AddImm { x, nn } => add_imm(state, x, nn),
            Move { x, y } => mov(state, x, y),
            Or { x, y } => or(state, x, y),
            And { x, y } => and(state, x, y),
            Xor { x, y } => xor(state, x, y),
            AddReg { x, y } => add_reg(state, x, y),
            Sub { x, y } => sub(state, x, y),
            ShiftRight { x, y } => shift_right(state, x, y, quirks),
            SubReverse { x, y } => sub_reverse(state, x, y),
            ShiftLeft { x, y } => shift_left(state, x, y, quirks),
            SkipNeReg { x, y } => skip_ne_reg(state, x, y),
            LoadIndex { addr } => load_index(state, addr),
            JumpOffset { addr } => jump_offset(state, addr),
            Random { x, mask } => random(state, x, mask, &mut *machine.rng),
            Draw { x, y, height } => draw(state, x, y, height, quirks),
            SkipKeyPressed { x } => skip_key_pressed(state, x, machine.keys),
            SkipKeyReleased { x } => skip_key_released(state, x, machine.keys),
            LoadDelay { x } => load_delay(state, x),
            WaitKey { x } => wait_key(state, x, machine.keys),
            SetDelay { x } => set_delay(state, x),
            SetSound { x } => set_sound(state, x),
            AddIndex { x } => add_index(state, x),
            LoadGlyph { x } => load_glyph(state, x),
            StoreBcd { x } => store_bcd(state, x),
            StoreRegisters { x } => store_registers(state, x),
            LoadRegisters { x } => load_registers(state, x),
            Unrecognized(_) => Ok(*state),
        }
    }
}

/// Conventional assembler mnemonics
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Clear => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { addr } => write!(f, "JP {:#05X}", addr),
            Call { addr } => write!(f, "CALL {:#05X}", addr),
            SkipEqImm { x, nn } => write!(f, "SE V{:X}, {:#04X}", x, nn),
            SkipNeImm { x, nn } => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm { x, nn } => write!(f, "LD V{:X}, {:#04X}", x, nn),
            AddImm { x, nn } => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex { addr } => write!(f, "LD I, {:#05X}", addr),
            JumpOffset { addr } => write!(f, "JP V0, {:#05X}", addr),
            Random { x, mask } => write!(f, "RND V{:X}, {:#04X}", x, mask),
            Draw { x, y, height } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, height),
            SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipKeyReleased { x } => write!(f, "SKNP V{:X}", x),
            LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            LoadGlyph { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
            Unrecognized(word) => write!(f, "DW {:#06X}", word),
        }
    }
}
