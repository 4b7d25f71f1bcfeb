use crate::config::Config;
use crate::error::Result;
use crate::interpreter::{Chip8Interpreter, Step};
use crate::machine::RunState;

/// What the host needs to know after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    /// the framebuffer changed since the last reported frame
    pub redraw: bool,
    /// the sound timer is still running
    pub sound: bool,
}

/// Runs a fixed batch of instructions per 1/60s tick and counts the timers
/// down. Pacing to wall-clock time is the caller's job.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    instructions_per_tick: u32,
}

impl FrameScheduler {
    pub fn new(config: &Config) -> Self {
        FrameScheduler {
            instructions_per_tick: config.instructions_per_tick(),
        }
    }

    pub fn instructions_per_tick(&self) -> u32 {
        self.instructions_per_tick
    }

    /// one frame's worth of work. input for this frame must already be applied
    pub fn tick(&self, interpreter: &mut Chip8Interpreter) -> Result<Frame> {
        if interpreter.state().run_state() != RunState::Running {
            return Ok(Frame {
                redraw: false,
                sound: interpreter.state().sound_active(),
            });
        }

        for _ in 0..self.instructions_per_tick {
            match interpreter.step()? {
                Step::Executed => {}
                // no point spinning on FX0A, the keys won't change until next frame
                Step::WaitingForKey | Step::Idle => break,
            }
        }

        let state = interpreter.state_mut();
        state.decrement_timers();
        Ok(Frame {
            redraw: state.take_redraw(),
            sound: state.sound_active(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Chip8Error;
    use crate::input::HostEvent;

    fn setup(program: &[u8]) -> (FrameScheduler, Chip8Interpreter) {
        let config = Config::default();
        (
            FrameScheduler::new(&config),
            Chip8Interpreter::new(program, &config).unwrap(),
        )
    }

    #[test]
    fn test_default_batch_size() {
        let (s, _) = setup(&[]);
        assert_eq!(s.instructions_per_tick(), 8);
    }

    #[test]
    fn test_tick_runs_a_batch() -> Result<()> {
        // 7001 over and over
        let program: Vec<u8> = [0x70, 0x01].repeat(20);
        let (s, mut c) = setup(&program);
        s.tick(&mut c)?;
        assert_eq!(c.state().v(0), 8);
        assert_eq!(c.state().pc(), 0x210);
        s.tick(&mut c)?;
        assert_eq!(c.state().v(0), 16);
        Ok(())
    }

    #[test]
    fn test_timers_count_down_once_per_tick() -> Result<()> {
        // 6003 F015 F018 then spin on 1206
        let (s, mut c) = setup(&[0x60, 0x03, 0xf0, 0x15, 0xf0, 0x18, 0x12, 0x06]);
        let frame = s.tick(&mut c)?;
        assert_eq!(c.state().delay_timer(), 2);
        assert!(frame.sound);
        s.tick(&mut c)?;
        let frame = s.tick(&mut c)?;
        assert_eq!(c.state().delay_timer(), 0);
        assert!(!frame.sound);
        s.tick(&mut c)?;
        assert_eq!(c.state().sound_timer(), 0);
        Ok(())
    }

    #[test]
    fn test_redraw_reported_once() -> Result<()> {
        // 00E0 then spin
        let (s, mut c) = setup(&[0x00, 0xe0, 0x12, 0x02]);
        assert!(s.tick(&mut c)?.redraw);
        assert!(!s.tick(&mut c)?.redraw);
        Ok(())
    }

    #[test]
    fn test_paused_tick_is_inert() -> Result<()> {
        let (s, mut c) = setup(&[0x70, 0x01, 0x12, 0x00]);
        c.state_mut().sound_timer = 5;
        c.handle_event(HostEvent::TogglePause);
        let frame = s.tick(&mut c)?;
        assert_eq!(c.state().pc(), 0x200);
        assert_eq!(c.state().sound_timer(), 5);
        assert!(frame.sound);
        assert!(!frame.redraw);
        c.handle_event(HostEvent::TogglePause);
        s.tick(&mut c)?;
        assert_eq!(c.state().sound_timer(), 4);
        Ok(())
    }

    #[test]
    fn test_key_wait_still_counts_timers() -> Result<()> {
        // 6010 F015 F10A 6201
        let (s, mut c) = setup(&[0x60, 0x10, 0xf0, 0x15, 0xf1, 0x0a, 0x62, 0x01]);
        s.tick(&mut c)?;
        assert_eq!(c.state().pc(), 0x204);
        assert_eq!(c.state().delay_timer(), 0x0f);
        s.tick(&mut c)?;
        assert_eq!(c.state().pc(), 0x204);
        assert_eq!(c.state().delay_timer(), 0x0e);

        c.handle_event(HostEvent::KeyDown(0x7));
        s.tick(&mut c)?;
        assert_eq!(c.state().v(0x1), 0x7);
        assert_eq!(c.state().v(0x2), 0x1);
        Ok(())
    }

    #[test]
    fn test_fault_halts_and_propagates() {
        let (s, mut c) = setup(&[0x00, 0xee]);
        assert!(matches!(
            s.tick(&mut c),
            Err(Chip8Error::StackUnderflow { .. })
        ));
        assert_eq!(c.state().run_state(), RunState::Halted);
        assert_eq!(s.tick(&mut c).unwrap(), Frame::default());
    }
}
