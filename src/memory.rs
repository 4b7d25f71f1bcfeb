use crate::error::{Chip8Error, Result};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const PROGRAM_ADDR: u16 = 0x0200;

/// biggest program image that fits between PROGRAM_ADDR and the top of RAM
pub const MAX_PROGRAM_BYTES: usize = RAM_SIZE_BYTES - PROGRAM_ADDR as usize;

/// where the hex digit glyphs live; glyph `g` starts at `FONT_ADDR + 5 * g`
pub const FONT_ADDR: u16 = 0x000;
pub const FONT_GLYPH_BYTES: u16 = 5;

const ADDR_MASK: u16 = 0x0fff;

/// Represents the flat, byte-addressable store of the machine.
///
/// `read_byte`, `write_byte`, `get_word` and `write` take every address modulo
/// the size of RAM, so a stray index register can never reach outside the
/// store. The raw slices don't wrap.
pub trait MemoryMap {
    /// get a r/w slice of the underlying memory; `addr..addr + len` must lie
    /// inside RAM
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory; `addr..addr + len` must lie
    /// inside RAM
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];

    fn read_byte(&self, addr: u16) -> u8 {
        self.get_ro_slice(addr & ADDR_MASK, 1)[0]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.get_rw_slice(addr & ADDR_MASK, 1)[0] = value;
    }

    /// get a big-endian two-byte word (opcode fetch)
    fn get_word(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    /// write a chunk of bytes starting at `addr`, wrapping at the top of RAM
    fn write(&mut self, addr: u16, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(offset as u16), *byte);
        }
    }
}

/// The 4K CHIP-8 memory map:
///   0x0000-0x004f  font glyphs (0-F)
///   0x0050-0x01ff  reserved for the interpreter, left zeroed
///   0x0200-0x0fff  program
pub struct Chip8Memory {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8Memory {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

impl Chip8Memory {
    /// zeroed RAM with the font baked in below the program area
    pub fn new() -> Self {
        let mut mm = Chip8Memory {
            bytes: vec![0u8; RAM_SIZE_BYTES].into_boxed_slice(),
        };
        mm.write(FONT_ADDR, &CHIP8_FONT);
        mm
    }

    /// copy a raw program image in at 0x200, refusing anything that can't fit
    pub fn load_program(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > MAX_PROGRAM_BYTES {
            return Err(Chip8Error::ImageTooLarge {
                size: image.len(),
                max: MAX_PROGRAM_BYTES,
            });
        }
        self.get_rw_slice(PROGRAM_ADDR, image.len())
            .copy_from_slice(image);
        Ok(())
    }
}

impl Default for Chip8Memory {
    fn default() -> Self {
        Self::new()
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8Memory::new();
        // NB. memory is zeroed from 0x50 because before that we bake in the font
        assert_eq!(m.bytes[0x50..], [0; 0xfb0]);
    }

    #[test]
    fn test_font_glyphs() {
        let m = Chip8Memory::new();
        // glyph 1
        assert_eq!(m.get_ro_slice(5, 5), &[0x20, 0x60, 0x20, 0x20, 0x70]);
        // glyph F
        assert_eq!(
            m.get_ro_slice(FONT_GLYPH_BYTES * 0xf, 5),
            &[0xF0, 0x80, 0xF0, 0x80, 0x80]
        );
    }

    #[test]
    fn test_write_slice_ok() {
        let mut dst = Chip8Memory::new();
        dst.write(0x308, &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            dst.bytes[0x300..0x310],
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8Memory::new();
        m.write(0x300, &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(m.get_word(0x304), 0x0405);
    }

    #[test]
    fn test_addresses_wrap_at_top_of_ram() {
        let mut m = Chip8Memory::new();
        m.write(0x0fff, &[0xaa, 0xbb]);
        assert_eq!(m.read_byte(0x0fff), 0xaa);
        assert_eq!(m.read_byte(0x0000), 0xbb);
        assert_eq!(m.get_word(0x0fff), 0xaabb);
        // upper nibble of a 16-bit address is ignored
        assert_eq!(m.read_byte(0x1fff), 0xaa);
    }

    #[test]
    fn test_slices_stop_at_top_of_ram() {
        let mut m = Chip8Memory::new();
        m.write(0x0ffe, &[0x12, 0x34]);
        assert_eq!(m.get_ro_slice(0x0ffe, 2), &[0x12, 0x34]);
        assert_eq!(m.get_rw_slice(0x0fff, 1), &mut [0x34]);
    }

    #[test]
    #[should_panic]
    fn test_slice_past_top_of_ram_panics() {
        let m = Chip8Memory::new();
        m.get_ro_slice(0x0fff, 2);
    }

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut dst = Chip8Memory::new();
        let prog: &[u8] = &[0x00, 0xe0]; // clear screen
        dst.load_program(prog)?;
        assert_eq!(dst.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_load_fills_ram_exactly() -> Result<()> {
        let mut dst = Chip8Memory::new();
        dst.load_program(&[0x12; MAX_PROGRAM_BYTES])?;
        assert_eq!(dst.read_byte(0x0fff), 0x12);
        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut dst = Chip8Memory::new();
        let err = dst.load_program(&[0; MAX_PROGRAM_BYTES + 1]).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::ImageTooLarge {
                size: 3585,
                max: 3584
            }
        ));
        // nothing was written
        assert_eq!(dst.read_byte(0x200), 0);
    }
}
