use crate::error::Result;
use crate::machine::KEY_COUNT;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// map of characters read from the keyboard to the COSMAC hex keypad, using
/// the left-hand side of a qwerty keyboard:
///   1 2 3 4      1 2 3 C
///   q w e r  ->  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// Something the host wants the machine to know about before the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    KeyDown(u8),
    KeyUp(u8),
    TogglePause,
    Quit,
}

/// reads keypresses and other host events
pub trait Input {
    /// everything that happened since the last poll, oldest first
    fn poll_events(&mut self) -> Result<Vec<HostEvent>>;
}

/// Terminals only report presses (and auto-repeats), never releases, so a key
/// counts as down until it goes `hold_frames` polls without being pressed.
#[derive(Debug)]
struct KeyLatch {
    hold_frames: u32,
    remaining: [u32; KEY_COUNT],
}

impl KeyLatch {
    fn new(hold_frames: u32) -> Self {
        KeyLatch {
            hold_frames: hold_frames.max(1),
            remaining: [0; KEY_COUNT],
        }
    }

    /// a press or repeat; only the first one is news
    fn press(&mut self, key: u8) -> Option<HostEvent> {
        let slot = &mut self.remaining[usize::from(key & 0xf)];
        let fresh = *slot == 0;
        // +1 because this poll's age() is still to come
        *slot = self.hold_frames + 1;
        fresh.then(|| HostEvent::KeyDown(key))
    }

    /// one poll has gone by; release anything that has run out
    fn age(&mut self) -> Vec<HostEvent> {
        let mut released = Vec::new();
        for (key, slot) in self.remaining.iter_mut().enumerate() {
            if *slot == 0 {
                continue;
            }
            *slot -= 1;
            if *slot == 0 {
                released.push(HostEvent::KeyUp(key as u8));
            }
        }
        released
    }
}

/// Input from the controlling terminal, read with crossterm. Esc toggles
/// pause; Ctrl-C or Backspace quits.
pub struct TermInput {
    keymap: HashMap<char, u8>,
    latch: KeyLatch,
}

impl TermInput {
    pub fn new(hold_frames: u32) -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            latch: KeyLatch::new(hold_frames),
        })
    }

    fn translate(&mut self, evt: KeyEvent) -> Option<HostEvent> {
        match evt.code {
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(HostEvent::Quit)
            }
            KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                Some(mapped_key) => self.latch.press(*mapped_key),
                None => {
                    debug!("Can't map {:?} to a COSMAC key", key);
                    None
                }
            },
            KeyCode::Esc => Some(HostEvent::TogglePause),
            KeyCode::Backspace => Some(HostEvent::Quit),
            _ => None,
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Couldn't leave raw mode: {}", e);
        }
    }
}

impl Input for TermInput {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                events.extend(self.translate(evt));
            }
        }
        events.extend(self.latch.age());
        Ok(events)
    }
}

/// replays canned events, one batch per poll; useful for testing
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<HostEvent>>,
}

impl ScriptedInput {
    pub fn new(frames: Vec<Vec<HostEvent>>) -> Self {
        ScriptedInput {
            frames: frames.into(),
        }
    }
}

impl Input for ScriptedInput {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
