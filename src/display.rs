use crate::config::Config;
use crate::error::Result;
use crate::framebuffer::Framebuffer;
use log::warn;
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the host loop to put the framebuffer on a screen. It
/// only ever gets read access, so any kind of screen will do.
pub trait Display {
    fn draw(&mut self, frame: &Framebuffer) -> Result<()>;
}

// store useful metadata about the screen
struct Resolution(usize, usize);

impl Resolution {
    fn of(frame: &Framebuffer) -> Self {
        Resolution(frame.width(), frame.height())
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// terminal cells needed, including a one cell border each side
    fn area(&self) -> Rect {
        Rect::new(0, 0, 2 + self.0 as u16, 2 + self.1 as u16)
    }

    /// lit (`on`) or dark pixels as canvas coordinates; y grows downwards on
    /// the CHIP-8 but upwards on the canvas
    fn plane(&self, frame: &Framebuffer, on: bool) -> Vec<(f64, f64)> {
        let w = self.0;
        frame
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == on)
            .map(|(i, _)| ((i % w) as f64, -1.0 * (i / w) as f64))
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    fg: Color,
    bg: Color,
    outline: bool,
}

impl MonoTermDisplay {
    pub fn new(config: &Config) -> Result<MonoTermDisplay> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            fg: config.fg,
            bg: config.bg,
            outline: config.outline,
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<()> {
        let resolution = Resolution::of(frame);
        let (fg, bg) = (self.fg, self.bg);
        let borders = if self.outline {
            Borders::ALL
        } else {
            Borders::NONE
        };

        // for now this assumes a 1:1 ratio between terminal cells, chip8
        // pixels and the internal TUI canvas
        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(borders)
                        .style(Style::default().bg(bg)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution.plane(frame, false),
                        color: bg,
                    });
                    ctx.draw(&Points {
                        coords: &resolution.plane(frame, true),
                        color: fg,
                    });
                });
            f.render_widget(canvas, resolution.area());
        })?;
        Ok(())
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.show_cursor() {
            warn!("Couldn't restore the cursor: {}", e);
        }
    }
}

/// useful for testing non-display routines; remembers what it was given
#[derive(Debug, Default)]
pub struct DummyDisplay {
    pub frames_drawn: usize,
    pub last: Option<Framebuffer>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<()> {
        self.frames_drawn += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}
