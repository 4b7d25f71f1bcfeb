//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * the machine is one owned [`MachineState`]; nothing global
//! * the interpreter runs one instruction per step and never blocks; FX0A
//!   parks the machine in an explicit key-wait state instead
//! * the frame scheduler runs `clock_speed / 60` steps per tick, then counts
//!   the timers down and reports whether the screen needs redrawing
//! * display, input and audio sit behind traits, so the core doesn't know or
//!   care that the default host is a terminal
//! * quirks where interpreters historically disagree are configuration, not
//!   guesses
//!
//! Model
//!
//! Emulator (60Hz host loop)
//!  |-- display, input, sound
//!  |-- frame scheduler(config)
//!  `-- interpreter(config)
//!       |-- machine state: memory(font, program), registers, stack, timers,
//!       |   keys, framebuffer
//!       |-- decoder: opcode -> instruction
//!       `-- trace sink(config)
pub mod config;
pub mod display;
pub mod emulator;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod scheduler;
pub mod sound;
pub mod trace;

pub use config::{Config, Quirks};
pub use error::{Chip8Error, Result};
pub use framebuffer::Framebuffer;
pub use input::HostEvent;
pub use instruction::Instruction;
pub use interpreter::{Chip8Interpreter, Step};
pub use machine::{MachineState, RunState, WaitState};
pub use scheduler::{Frame, FrameScheduler};
