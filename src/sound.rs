use crate::error::{Chip8Error, Result};
use beep::beep;

/// Tone output. The host starts the tone when the sound timer starts running
/// and stops it when it runs out.
pub trait Sound {
    fn beep(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// square wave on the PC speaker
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<()> {
        if !self.is_beeping {
            beep(SIMPLEBEEP_PITCH).map_err(|e| Chip8Error::Audio(e.to_string()))?;
            self.is_beeping = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.is_beeping {
            beep(0).map_err(|e| Chip8Error::Audio(e.to_string()))?;
            self.is_beeping = false;
        }
        Ok(())
    }
}

impl Drop for SimpleBeep {
    fn drop(&mut self) {
        // don't leave the speaker on
        let _ = self.stop();
    }
}

#[derive(Debug, Default)]
pub struct Mute {}

impl Mute {
    pub fn new() -> Self {
        Mute {}
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
