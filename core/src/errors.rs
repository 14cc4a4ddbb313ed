use thiserror::Error;

/// A defect in the running program.
///
/// Faults are never surfaced to the program itself; the interpreter records the first one and
/// refuses to step again until it is re-initialized.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("stack overflow: call at {pc:#06X} with all 16 return slots in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("address {address:#06X} out of range (instruction at {pc:#06X})")]
    AddressOutOfRange { address: usize, pc: u16 },

    #[error("odd jump target {address:#06X} (instruction at {pc:#06X})")]
    MisalignedAddress { address: u16, pc: u16 },
}

/// Everything a host can get back from the interpreter
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("unable to read program: {0}")]
    Io(#[from] std::io::Error),

    #[error("fault: {0}")]
    Fault(#[from] Fault),

    #[error("halted after an earlier fault: {0}")]
    Halted(Fault),

    #[error("key {0:#X} does not exist; keys are 0x0..=0xF")]
    InvalidKey(u8),
}
