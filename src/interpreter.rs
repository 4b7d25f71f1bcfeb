//! # interpreter
//!
//! One call to [`Chip8Interpreter::step`] is one fetch/decode/execute cycle:
//!  1. fetch the big-endian word at PC
//!  2. move PC on by 2, so jumps and calls land on absolute targets
//!  3. decode into an [`Instruction`] and dispatch on its top nibble, with a
//!     second look at N (0x8) or NN (0x0, 0xE, 0xF) for the grouped opcodes
//!  4. hand the result to the trace sink, if there is one
//!
//! Unknown opcodes do nothing. Stack faults halt the machine and come back as
//! errors with PC still pointing at the offending instruction. FX0A with no
//! key down parks the machine in [`WaitState::WaitingForKey`]; later steps
//! check the keys again and finish the instruction once one is down.
use crate::config::{Config, Quirks};
use crate::error::Result;
use crate::framebuffer::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::input::HostEvent;
use crate::instruction::Instruction;
use crate::machine::{MachineState, RunState, WaitState};
use crate::memory::{MemoryMap, FONT_ADDR, FONT_GLYPH_BYTES};
use crate::trace::{LogTrace, TraceSink};
use log::{debug, error};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed,
    /// parked on FX0A until a key is down
    WaitingForKey,
    /// paused or halted; nothing ran
    Idle,
}

pub struct Chip8Interpreter {
    state: MachineState,
    quirks: Quirks,
    rng: StdRng,
    trace: Option<Box<dyn TraceSink>>,
}

impl Chip8Interpreter {
    /// load a chip8 program and get ready to run it from 0x200
    pub fn new(image: &[u8], config: &Config) -> Result<Chip8Interpreter> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let trace: Option<Box<dyn TraceSink>> = if config.trace {
            Some(Box::new(LogTrace))
        } else {
            None
        };
        Ok(Chip8Interpreter {
            state: MachineState::new(image)?,
            quirks: config.quirks,
            rng,
            trace,
        })
    }

    /// swap in a different trace sink, or none
    pub fn set_trace(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.trace = sink;
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    /// apply one host input event to the machine
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::KeyDown(key) => self.state.set_key(key as usize, true),
            HostEvent::KeyUp(key) => self.state.set_key(key as usize, false),
            HostEvent::TogglePause => {
                // nothing stays held across a pause
                self.state.toggle_pause();
                self.state.release_all_keys();
            }
            HostEvent::Quit => self.state.halt(),
        }
    }

    /// run one instruction
    pub fn step(&mut self) -> Result<Step> {
        if self.state.run_state != RunState::Running {
            return Ok(Step::Idle);
        }
        if let WaitState::WaitingForKey { .. } = self.state.wait {
            let addr = self.state.pc;
            if !self.resume_if_key() {
                return Ok(Step::WaitingForKey);
            }
            // the FX0A only finishes now, so this is where it gets traced
            if let Some(sink) = self.trace.as_mut() {
                let inst = Instruction::decode(self.state.memory.get_word(addr));
                sink.record(addr, &inst, &self.state);
            }
            return Ok(Step::Executed);
        }

        let addr = self.state.pc;
        let inst = Instruction::decode(self.state.memory.get_word(addr));
        self.state.pc = addr.wrapping_add(2);

        if let Err(e) = self.execute(&inst, addr) {
            // leave PC on the instruction that faulted
            self.state.pc = addr;
            error!("{} [opcode: {:04X}]", e, inst.opcode);
            self.state.halt();
            return Err(e);
        }

        if let Some(sink) = self.trace.as_mut() {
            sink.record(addr, &inst, &self.state);
        }

        Ok(match self.state.wait {
            WaitState::Ready => Step::Executed,
            WaitState::WaitingForKey { .. } => Step::WaitingForKey,
        })
    }

    /// finish a pending FX0A if any key is down: the lowest one lands in the
    /// target register and PC moves past the FX0A
    pub fn resume_if_key(&mut self) -> bool {
        let register = match self.state.wait {
            WaitState::WaitingForKey { register } => register,
            WaitState::Ready => return false,
        };
        match self.state.first_key_down() {
            Some(key) => {
                self.state.v[register] = key;
                self.state.pc = self.state.pc.wrapping_add(2);
                self.state.wait = WaitState::Ready;
                debug!("Key wait over [key: {:X}] [V{:X}]", key, register);
                true
            }
            None => false,
        }
    }

    fn execute(&mut self, inst: &Instruction, addr: u16) -> Result<()> {
        let (x, y) = (inst.x, inst.y);
        match inst.group() {
            0x0 => match inst.imm {
                // 00E0
                0xe0 => {
                    self.state.display.clear();
                    self.state.redraw = true;
                }
                // 00EE
                0xee => self.state.pc = self.state.pop_return(addr)?,
                // 0NNN machine code routines aren't supported
                _ => {}
            },
            // 1NNN
            0x1 => self.state.pc = inst.addr,
            // 2NNN
            0x2 => {
                let ret = self.state.pc;
                self.state.push_return(ret, addr)?;
                self.state.pc = inst.addr;
            }
            // 3XNN
            0x3 => self.skip_if(self.state.v[x] == inst.imm),
            // 4XNN
            0x4 => self.skip_if(self.state.v[x] != inst.imm),
            // 5XY0
            0x5 => self.skip_if(self.state.v[x] == self.state.v[y]),
            // 6XNN
            0x6 => self.state.v[x] = inst.imm,
            // 7XNN, no carry flag
            0x7 => self.state.v[x] = self.state.v[x].wrapping_add(inst.imm),
            0x8 => self.alu(inst),
            // 9XY0
            0x9 => self.skip_if(self.state.v[x] != self.state.v[y]),
            // ANNN
            0xa => self.state.i = inst.addr,
            // BNNN
            0xb => self.state.pc = u16::from(self.state.v[0]) + inst.addr,
            // CXNN
            0xc => self.state.v[x] = self.rng.gen::<u8>() & inst.imm,
            // DXYN
            0xd => self.draw(inst),
            0xe => {
                let down = self.state.key(usize::from(self.state.v[x] & 0xf));
                match inst.imm {
                    // EX9E
                    0x9e => self.skip_if(down),
                    // EXA1
                    0xa1 => self.skip_if(!down),
                    _ => {}
                }
            }
            0xf => self.misc(inst, addr),
            _ => unreachable!("opcode group is a nibble"),
        }
        Ok(())
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.state.pc = self.state.pc.wrapping_add(2);
        }
    }

    /// 8XYN register to register arithmetic. VF is written before VX, and VX
    /// is recomputed from the registers afterwards
    fn alu(&mut self, inst: &Instruction) {
        let (x, y) = (inst.x, inst.y);
        let v = &mut self.state.v;
        match inst.nibble {
            0x0 => v[x] = v[y],
            0x1 => v[x] |= v[y],
            0x2 => v[x] &= v[y],
            0x3 => v[x] ^= v[y],
            0x4 => {
                v[0xf] = u8::from(u16::from(v[x]) + u16::from(v[y]) > 0xff);
                v[x] = v[x].wrapping_add(v[y]);
            }
            0x5 => {
                v[0xf] = u8::from(v[y] <= v[x]);
                v[x] = v[x].wrapping_sub(v[y]);
            }
            0x6 => {
                if self.quirks.shift_uses_vy {
                    v[x] = v[y];
                }
                v[0xf] = v[x] & 0x1;
                v[x] >>= 1;
            }
            0x7 => {
                v[0xf] = u8::from(v[x] <= v[y]);
                v[x] = v[y].wrapping_sub(v[x]);
            }
            0xe => {
                if self.quirks.shift_uses_vy {
                    v[x] = v[y];
                }
                v[0xf] = (v[x] >> 7) & 0x1;
                v[x] <<= 1;
            }
            _ => {}
        }
    }

    /// DXYN: XOR an 8xN sprite from I onto the screen at (VX, VY). the origin
    /// wraps, the sprite itself clips at the right and bottom edges
    fn draw(&mut self, inst: &Instruction) {
        let x0 = usize::from(self.state.v[inst.x]) % DISPLAY_WIDTH;
        let y0 = usize::from(self.state.v[inst.y]) % DISPLAY_HEIGHT;
        self.state.v[0xf] = 0;

        for row in 0..usize::from(inst.nibble) {
            let y = y0 + row;
            if y >= DISPLAY_HEIGHT {
                break;
            }
            let sprite = self
                .state
                .memory
                .read_byte(self.state.i.wrapping_add(row as u16));
            for col in 0..8 {
                let x = x0 + col;
                if x >= DISPLAY_WIDTH {
                    break;
                }
                let bit = sprite & (0x80 >> col) != 0;
                if self.state.display.toggle(x, y, bit) {
                    self.state.v[0xf] = 1;
                }
            }
        }

        self.state.redraw = true;
    }

    /// FXNN timers, keys, index register and bulk memory transfers
    fn misc(&mut self, inst: &Instruction, addr: u16) {
        let x = inst.x;
        match inst.imm {
            // FX07
            0x07 => self.state.v[x] = self.state.delay_timer,
            // FX0A
            0x0a => match self.state.first_key_down() {
                Some(key) => self.state.v[x] = key,
                None => {
                    self.state.pc = addr;
                    self.state.wait = WaitState::WaitingForKey { register: x };
                    debug!("Waiting for key [V{:X}]", x);
                }
            },
            // FX15
            0x15 => self.state.delay_timer = self.state.v[x],
            // FX18
            0x18 => self.state.sound_timer = self.state.v[x],
            // FX1E
            0x1e => {
                let i = self.state.i.wrapping_add(u16::from(self.state.v[x]));
                self.state.i = i;
                if self.quirks.index_add_sets_vf {
                    self.state.v[0xf] = u8::from(i > 0x0fff);
                }
            }
            // FX29, only the low nibble picks the glyph
            0x29 => {
                self.state.i = FONT_ADDR + u16::from(self.state.v[x] & 0xf) * FONT_GLYPH_BYTES
            }
            // FX33
            0x33 => {
                let value = self.state.v[x];
                let i = self.state.i;
                self.state
                    .memory
                    .write(i, &[value / 100, (value / 10) % 10, value % 10]);
            }
            // FX55, I is left alone
            0x55 => {
                let i = self.state.i;
                let regs = self.state.v;
                self.state.memory.write(i, &regs[..=x]);
            }
            // FX65, I is left alone
            0x65 => {
                let i = self.state.i;
                for offset in 0..=x {
                    self.state.v[offset] = self.state.memory.read_byte(i.wrapping_add(offset as u16));
                }
            }
            _ => {}
        }
    }
}
