//! An interpreter for the Chip-8 instruction set, sized for hosts that can't spare much:
//! memory is a fixed 4096 byte array and the whole machine is one `Copy` state value.
//!
//! The host owns the loop. It loads a program image, then calls `Chip8::step` at the CPU's
//! rate, feeding key state in and reading the frame buffer out between steps.
pub use chip8::{Chip8, Diagnostics};
pub use config::{Config, Quirks};
pub use constants::{CLOCK_SPEED, DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT, TIMER_HZ};
pub use errors::{Chip8Error, Fault};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use random::{ByteSequence, RandomSource};
pub use state::{FrameBuffer, Keypad};

mod chip8;
pub mod config;
pub mod constants;
mod errors;
mod instruction;
mod opcode;
mod operations;
pub mod random;
mod state;
