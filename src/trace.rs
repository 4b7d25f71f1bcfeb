use crate::instruction::Instruction;
use crate::machine::MachineState;
use log::trace;

/// Called by the interpreter after every dispatched instruction.
pub trait TraceSink {
    /// `addr` is where `inst` was fetched from; `state` is the machine after it ran
    fn record(&mut self, addr: u16, inst: &Instruction, state: &MachineState);
}

/// forwards each instruction to the `log` facade at trace level
#[derive(Debug, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn record(&mut self, addr: u16, inst: &Instruction, state: &MachineState) {
        trace!(
            "{:#06X}: {} [I: {:#06X}] [V: {:02X?}] [stack: {}]",
            addr,
            inst,
            state.i(),
            state.registers(),
            state.stack().len()
        );
    }
}
