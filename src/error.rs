use std::io;

/// Everything that can go wrong loading or running a CHIP-8 program.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("program image is too large ({size} bytes), max size is {max} bytes")]
    ImageTooLarge { size: usize, max: usize },

    #[error("stack overflow: subroutine call at {pc:#06X} with 12 return addresses already stacked")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("audio device failed: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
