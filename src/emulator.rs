use crate::config::FRAME_RATE;
use crate::display::Display;
use crate::error::Result;
use crate::input::Input;
use crate::interpreter::Chip8Interpreter;
use crate::machine::RunState;
use crate::scheduler::FrameScheduler;
use crate::sound::Sound;
use log::info;
use spin_sleep::LoopHelper;

/// The host side of the machine: feeds it input, paces it at 60Hz and passes
/// its screen and tone on to the display and sound devices.
pub struct Emulator<'a> {
    interpreter: Chip8Interpreter,
    scheduler: FrameScheduler,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    sounding: bool,
    frames: u64,
}

impl<'a> Emulator<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        scheduler: FrameScheduler,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        Emulator {
            interpreter,
            scheduler,
            display,
            input,
            sound,
            sounding: false,
            frames: 0,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    /// frames that actually ran, paused ones included
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// one host frame: input, then the scheduler tick, then screen and sound.
    /// returns false once the machine has halted
    pub fn run_frame(&mut self) -> Result<bool> {
        for event in self.input.poll_events()? {
            self.interpreter.handle_event(event);
        }
        if self.interpreter.state().run_state() == RunState::Halted {
            self.set_tone(false)?;
            return Ok(false);
        }

        let frame = self.scheduler.tick(&mut self.interpreter)?;
        self.frames += 1;
        if frame.redraw {
            self.display.draw(self.interpreter.state().framebuffer())?;
        }
        self.set_tone(frame.sound)?;

        Ok(self.interpreter.state().run_state() != RunState::Halted)
    }

    /// run at 60 frames a second until the machine halts, or for at most
    /// `max_frames` frames
    pub fn main_loop(&mut self, max_frames: Option<u64>) -> Result<()> {
        let mut loop_helper = LoopHelper::builder().build_with_target_rate(f64::from(FRAME_RATE));
        info!(
            "Running [instructions/frame: {}]",
            self.scheduler.instructions_per_tick()
        );

        // start from a blank screen
        self.display.draw(self.interpreter.state().framebuffer())?;
        loop {
            loop_helper.loop_start();
            if !self.run_frame()? {
                break;
            }
            if max_frames.map_or(false, |max| self.frames >= max) {
                break;
            }
            loop_helper.loop_sleep();
        }
        self.set_tone(false)?;
        info!("Stopped [frames: {}]", self.frames);
        Ok(())
    }

    fn set_tone(&mut self, on: bool) -> Result<()> {
        if on != self.sounding {
            if on {
                self.sound.beep()?;
            } else {
                self.sound.stop()?;
            }
            self.sounding = on;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::DummyDisplay;
    use crate::error::Chip8Error;
    use crate::input::{HostEvent, ScriptedInput};

    #[derive(Default)]
    struct CountingSound {
        beeps: usize,
        stops: usize,
    }

    impl Sound for CountingSound {
        fn beep(&mut self) -> Result<()> {
            self.beeps += 1;
            Ok(())
        }
        fn stop(&mut self) -> Result<()> {
            self.stops += 1;
            Ok(())
        }
    }

    fn parts(program: &[u8]) -> (Chip8Interpreter, FrameScheduler) {
        let config = Config::default();
        (
            Chip8Interpreter::new(program, &config).unwrap(),
            FrameScheduler::new(&config),
        )
    }

    #[test]
    fn test_quit_stops_the_loop() -> Result<()> {
        let (interpreter, scheduler) = parts(&[0x12, 0x00]);
        let mut display = DummyDisplay::new();
        let mut input = ScriptedInput::new(vec![vec![], vec![], vec![HostEvent::Quit]]);
        let mut sound = CountingSound::default();
        let mut emu = Emulator::new(interpreter, scheduler, &mut display, &mut input, &mut sound);
        emu.main_loop(None)?;
        assert_eq!(emu.frames(), 2);
        assert_eq!(emu.interpreter().state().run_state(), RunState::Halted);
        Ok(())
    }

    #[test]
    fn test_redraws_only_when_told() -> Result<()> {
        // 00E0 then spin
        let (interpreter, scheduler) = parts(&[0x00, 0xe0, 0x12, 0x02]);
        let mut display = DummyDisplay::new();
        let mut input = ScriptedInput::default();
        let mut sound = CountingSound::default();
        {
            let mut emu =
                Emulator::new(interpreter, scheduler, &mut display, &mut input, &mut sound);
            for _ in 0..3 {
                assert!(emu.run_frame()?);
            }
        }
        assert_eq!(display.frames_drawn, 1);
        Ok(())
    }

    #[test]
    fn test_tone_follows_sound_timer_edges() -> Result<()> {
        // 6002 F018 then spin
        let (interpreter, scheduler) = parts(&[0x60, 0x02, 0xf0, 0x18, 0x12, 0x04]);
        let mut display = DummyDisplay::new();
        let mut input = ScriptedInput::default();
        let mut sound = CountingSound::default();
        {
            let mut emu =
                Emulator::new(interpreter, scheduler, &mut display, &mut input, &mut sound);
            emu.main_loop(Some(5))?;
        }
        assert_eq!(sound.beeps, 1);
        assert_eq!(sound.stops, 1);
        Ok(())
    }

    #[test]
    fn test_fault_ends_the_loop_with_an_error() {
        let (interpreter, scheduler) = parts(&[0x00, 0xee]);
        let mut display = DummyDisplay::new();
        let mut input = ScriptedInput::default();
        let mut sound = CountingSound::default();
        let mut emu = Emulator::new(interpreter, scheduler, &mut display, &mut input, &mut sound);
        assert!(matches!(
            emu.main_loop(None),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        ));
    }
}
