//! # machine state
//!
//! Everything the interpreter mutates lives in one owned [`MachineState`]:
//!  * 4K of memory, font at 0x000 and the program at 0x200
//!  * V0-VF, with VF doubling as the carry/borrow/collision flag
//!  * I, kept at 16 bits; only the low 12 reach memory
//!  * PC, starting at 0x200
//!  * a 12-deep return address stack
//!  * delay and sound timers, counted down at 60Hz by the scheduler
//!  * a 16-slot snapshot of which keys are down
//!  * the 64x32 framebuffer and its redraw flag
use crate::error::{Chip8Error, Result};
use crate::framebuffer::Framebuffer;
use crate::memory::{Chip8Memory, PROGRAM_ADDR};
use log::info;

pub const REGISTER_COUNT: usize = 16;
pub const KEY_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 12;

/// Bounded return address stack; push and pop say when they can't.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    slots: [u16; STACK_DEPTH],
    len: usize,
}

impl CallStack {
    pub fn push(&mut self, addr: u16) -> std::result::Result<(), u16> {
        if self.len == STACK_DEPTH {
            return Err(addr);
        }
        self.slots[self.len] = addr;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<u16> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.slots[self.len])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// stacked return addresses, oldest first
    pub fn as_slice(&self) -> &[u16] {
        &self.slots[..self.len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Halted,
}

/// Whether the program is parked on FX0A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Ready,
    WaitingForKey { register: usize },
}

pub struct MachineState {
    pub(crate) memory: Chip8Memory,
    pub(crate) v: [u8; REGISTER_COUNT],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) stack: CallStack,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) keys: [bool; KEY_COUNT],
    pub(crate) display: Framebuffer,
    pub(crate) redraw: bool,
    pub(crate) run_state: RunState,
    pub(crate) wait: WaitState,
}

impl MachineState {
    /// fresh machine with the font in place and `image` loaded at 0x200
    pub fn new(image: &[u8]) -> Result<Self> {
        let mut memory = Chip8Memory::new();
        memory.load_program(image)?;
        info!("Loaded program [size: {}]", image.len());
        Ok(MachineState {
            memory,
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_ADDR,
            stack: CallStack::default(),
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; KEY_COUNT],
            display: Framebuffer::new(),
            redraw: false,
            run_state: RunState::Running,
            wait: WaitState::Ready,
        })
    }

    pub fn v(&self, register: usize) -> u8 {
        self.v[register & 0xf]
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn memory(&self) -> &Chip8Memory {
        &self.memory
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// audio boundary: the tone should be playing
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.display
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn wait_state(&self) -> WaitState {
        self.wait
    }

    pub fn key(&self, key: usize) -> bool {
        self.keys[key & 0xf]
    }

    /// host input: apply a key-down/key-up for one of the 16 logical keys
    pub fn set_key(&mut self, key: usize, down: bool) {
        self.keys[key & 0xf] = down;
    }

    pub fn release_all_keys(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// lowest numbered key currently held
    pub fn first_key_down(&self) -> Option<u8> {
        self.keys.iter().position(|k| *k).map(|k| k as u8)
    }

    /// flip between running and paused; a halted machine stays halted
    pub fn toggle_pause(&mut self) {
        self.run_state = match self.run_state {
            RunState::Running => {
                info!("===PAUSED===");
                RunState::Paused
            }
            RunState::Paused => {
                info!("===RUNNING===");
                RunState::Running
            }
            RunState::Halted => RunState::Halted,
        };
    }

    pub fn halt(&mut self) {
        if self.run_state != RunState::Halted {
            info!("===HALTED===");
        }
        self.run_state = RunState::Halted;
    }

    /// count both timers down by one, stopping at zero
    pub fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// hand the redraw flag to the caller and clear it
    pub(crate) fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    pub(crate) fn push_return(&mut self, addr: u16, at: u16) -> Result<()> {
        self.stack
            .push(addr)
            .map_err(|_| Chip8Error::StackOverflow { pc: at })
    }

    pub(crate) fn pop_return(&mut self, at: u16) -> Result<u16> {
        self.stack
            .pop()
            .ok_or(Chip8Error::StackUnderflow { pc: at })
    }
}
