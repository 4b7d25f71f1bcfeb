use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chip8::config::{Config, Quirks, DEFAULT_CLOCK_SPEED};
use chip8::display::MonoTermDisplay;
use chip8::emulator::Emulator;
use chip8::input::TermInput;
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::{Chip8Interpreter, FrameScheduler};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use tui::style::Color;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    Black,
    White,
    Green,
    Amber,
    Blue,
    Red,
}

impl From<Colour> for Color {
    fn from(c: Colour) -> Self {
        match c {
            Colour::Black => Color::Black,
            Colour::White => Color::White,
            Colour::Green => Color::Green,
            Colour::Amber => Color::Rgb(0xff, 0xb0, 0x00),
            Colour::Blue => Color::Blue,
            Colour::Red => Color::Red,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chip8", about = "Run a CHIP-8 program in the terminal.")]
struct Args {
    /// Program image to load at 0x200.
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// Instructions executed per second.
    #[arg(long, default_value_t = DEFAULT_CLOCK_SPEED)]
    clock: u32,

    /// 8XY6/8XYE shift VY into VX instead of shifting VX in place.
    #[arg(long, default_value_t = false)]
    shift_vy: bool,

    /// FX1E sets VF when I runs past 0xFFF.
    #[arg(long, default_value_t = false)]
    index_carry: bool,

    /// Log every instruction at trace level (implies --log-level trace).
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Seed for CXNN, for repeatable runs.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Pixel colour.
    #[arg(long, value_enum, default_value_t = Colour::White)]
    fg: Colour,

    /// Background colour.
    #[arg(long, value_enum, default_value_t = Colour::Black)]
    bg: Colour,

    /// Don't draw a border round the screen.
    #[arg(long, default_value_t = false)]
    no_outline: bool,

    /// Sound the PC speaker while the sound timer runs.
    #[arg(long, default_value_t = false)]
    beep: bool,

    /// Frames a key stays down after the terminal last reported it.
    #[arg(long, value_name = "FRAMES", default_value_t = 6)]
    key_hold: u32,

    /// Log level for stderr output.
    #[arg(long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            clock_speed: self.clock,
            quirks: Quirks {
                shift_uses_vy: self.shift_vy,
                index_add_sets_vf: self.index_carry,
            },
            trace: self.trace,
            seed: self.seed,
            key_hold_frames: self.key_hold,
            fg: self.fg.into(),
            bg: self.bg.into(),
            outline: !self.no_outline,
            beep: self.beep,
        }
    }
}

fn run(args: &Args) -> chip8::Result<()> {
    let config = args.config();

    // load the program before touching the terminal, so a bad image is
    // reported on a sane screen
    let image = fs::read(&args.rom)?;
    let interpreter = Chip8Interpreter::new(&image, &config)?;
    let scheduler = FrameScheduler::new(&config);

    let mut display = MonoTermDisplay::new(&config)?;
    let mut input = TermInput::new(config.key_hold_frames)?;
    let mut sound: Box<dyn Sound> = if config.beep {
        Box::new(SimpleBeep::new())
    } else {
        Box::new(Mute::new())
    };

    let mut emulator = Emulator::new(
        interpreter,
        scheduler,
        &mut display,
        &mut input,
        sound.as_mut(),
    );
    emulator.main_loop(args.frames)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.trace {
        LevelFilter::Trace
    } else {
        args.log_level
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("Couldn't start logging: {}", e);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", args.rom.display(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8::Chip8Error;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["chip8", "pong.ch8"]).unwrap();
        let config = args.config();
        assert_eq!(args.rom, PathBuf::from("pong.ch8"));
        assert_eq!(config.clock_speed, DEFAULT_CLOCK_SPEED);
        assert_eq!(config.quirks, Quirks::default());
        assert!(config.outline);
        assert!(!config.trace);
        assert!(!config.beep);
        assert_eq!(config.seed, None);
        assert_eq!(config.key_hold_frames, 6);
        assert_eq!(args.log_level, LevelFilter::Warn);
        assert_eq!(args.frames, None);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let args = Args::try_parse_from([
            "chip8",
            "pong.ch8",
            "--clock",
            "720",
            "--shift-vy",
            "--index-carry",
            "--no-outline",
            "--trace",
            "--seed",
            "42",
            "--fg",
            "amber",
            "--key-hold",
            "3",
            "--frames",
            "100",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.clock_speed, 720);
        assert_eq!(config.instructions_per_tick(), 12);
        assert_eq!(
            config.quirks,
            Quirks {
                shift_uses_vy: true,
                index_add_sets_vf: true,
            }
        );
        assert!(!config.outline);
        assert!(config.trace);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.fg, Color::Rgb(0xff, 0xb0, 0x00));
        assert_eq!(config.bg, Color::Black);
        assert_eq!(config.key_hold_frames, 3);
        assert_eq!(args.frames, Some(100));
    }

    #[test]
    fn test_rom_is_required() {
        assert!(Args::try_parse_from(["chip8"]).is_err());
        assert!(Args::try_parse_from(["chip8", "pong.ch8", "--fg", "purple"]).is_err());
    }

    #[test]
    fn test_unreadable_image_is_fatal() {
        // the image is read before the terminal is touched
        let args = Args::try_parse_from(["chip8", "/nonexistent/dir/missing.ch8"]).unwrap();
        assert!(matches!(run(&args), Err(Chip8Error::Io(_))));
    }
}
