use tui::style::Color;

/// instructions per second, about right for most CHIP-8 programs
pub const DEFAULT_CLOCK_SPEED: u32 = 500;

/// host frame rate; timers and the scheduler both tick at this rate
pub const FRAME_RATE: u32 = 60;

/// Behaviours where historical CHIP-8 interpreters disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY6/8XYE copy VY into VX before shifting, instead of shifting VX in place
    pub shift_uses_vy: bool,
    /// FX1E sets VF when I + VX runs past 0xFFF
    pub index_add_sets_vf: bool,
}

/// Everything the interpreter and its host collaborators can be told at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// instructions per second
    pub clock_speed: u32,
    pub quirks: Quirks,
    /// log every dispatched instruction at trace level
    pub trace: bool,
    /// fixed seed for CXNN; entropy when unset
    pub seed: Option<u64>,
    /// frames a terminal key stays down after its last press/repeat
    pub key_hold_frames: u32,
    pub fg: Color,
    pub bg: Color,
    /// draw a border around the screen
    pub outline: bool,
    /// use the PC speaker; otherwise stay silent
    pub beep: bool,
}

impl Config {
    /// how many instructions run per 1/60s tick
    pub fn instructions_per_tick(&self) -> u32 {
        self.clock_speed / FRAME_RATE
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock_speed: DEFAULT_CLOCK_SPEED,
            quirks: Quirks::default(),
            trace: false,
            seed: None,
            key_hold_frames: 6,
            fg: Color::White,
            bg: Color::Black,
            outline: true,
            beep: false,
        }
    }
}
