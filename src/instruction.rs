use std::fmt;

/// Decoded view of a raw 16-bit opcode.
///
/// Decoding never fails: every word maps onto some set of fields, and it is
/// up to the interpreter whether a given combination means anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u16,
    /// NNN, the low 12 bits
    pub addr: u16,
    /// NN, the low byte
    pub imm: u8,
    /// N, the low nibble
    pub nibble: u8,
    /// X, bits 8-11
    pub x: usize,
    /// Y, bits 4-7
    pub y: usize,
}

impl Instruction {
    pub fn decode(opcode: u16) -> Self {
        Instruction {
            opcode,
            addr: opcode & 0x0fff,
            imm: (opcode & 0x00ff) as u8,
            nibble: (opcode & 0x000f) as u8,
            x: ((opcode & 0x0f00) >> 8) as usize,
            y: ((opcode & 0x00f0) >> 4) as usize,
        }
    }

    /// top nibble, the primary dispatch key
    pub fn group(&self) -> u8 {
        (self.opcode >> 12) as u8
    }

    /// human readable description, for traces
    pub fn describe(&self) -> String {
        let (x, y, nn, nnn) = (self.x, self.y, self.imm, self.addr);
        match (self.group(), self.nibble, self.imm) {
            (0x0, _, 0xe0) => "Clear screen".to_string(),
            (0x0, _, 0xee) => "Return from subroutine".to_string(),
            (0x1, _, _) => format!("Jump to address {:#06X}", nnn),
            (0x2, _, _) => format!("Call subroutine at {:#06X}", nnn),
            (0x3, _, _) => format!("Skip next if V{:X} == {:#04X}", x, nn),
            (0x4, _, _) => format!("Skip next if V{:X} != {:#04X}", x, nn),
            (0x5, _, _) => format!("Skip next if V{:X} == V{:X}", x, y),
            (0x6, _, _) => format!("Set V{:X} = {:#04X}", x, nn),
            (0x7, _, _) => format!("Set V{:X} += {:#04X}", x, nn),
            (0x8, 0x0, _) => format!("Set V{:X} = V{:X}", x, y),
            (0x8, 0x1, _) => format!("Set V{:X} |= V{:X}", x, y),
            (0x8, 0x2, _) => format!("Set V{:X} &= V{:X}", x, y),
            (0x8, 0x3, _) => format!("Set V{:X} ^= V{:X}", x, y),
            (0x8, 0x4, _) => format!("Set V{:X} += V{:X}, VF = carry", x, y),
            (0x8, 0x5, _) => format!("Set V{:X} -= V{:X}, VF = no borrow", x, y),
            (0x8, 0x6, _) => format!("Set V{:X} >>= 1, VF = shifted out bit", x),
            (0x8, 0x7, _) => format!("Set V{:X} = V{:X} - V{:X}, VF = no borrow", x, y, x),
            (0x8, 0xe, _) => format!("Set V{:X} <<= 1, VF = shifted out bit", x),
            (0x9, _, _) => format!("Skip next if V{:X} != V{:X}", x, y),
            (0xa, _, _) => format!("Set I = {:#06X}", nnn),
            (0xb, _, _) => format!("Jump to V0 + {:#06X}", nnn),
            (0xc, _, _) => format!("Set V{:X} = random & {:#04X}", x, nn),
            (0xd, n, _) => format!("Draw {} row sprite from I at (V{:X}, V{:X})", n, x, y),
            (0xe, _, 0x9e) => format!("Skip next if key V{:X} is down", x),
            (0xe, _, 0xa1) => format!("Skip next if key V{:X} is up", x),
            (0xf, _, 0x07) => format!("Set V{:X} = delay timer", x),
            (0xf, _, 0x0a) => format!("Wait for a key, store it in V{:X}", x),
            (0xf, _, 0x15) => format!("Set delay timer = V{:X}", x),
            (0xf, _, 0x18) => format!("Set sound timer = V{:X}", x),
            (0xf, _, 0x1e) => format!("Set I += V{:X}", x),
            (0xf, _, 0x29) => format!("Set I = glyph address of V{:X}", x),
            (0xf, _, 0x33) => format!("Store BCD of V{:X} at I", x),
            (0xf, _, 0x55) => format!("Store V0..=V{:X} at I", x),
            (0xf, _, 0x65) => format!("Load V0..=V{:X} from I", x),
            _ => "Unimplemented opcode".to_string(),
        }
    }
}

impl From<u16> for Instruction {
    fn from(opcode: u16) -> Self {
        Instruction::decode(opcode)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} {}", self.opcode, self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fields() {
        let i = Instruction::decode(0xd12f);
        assert_eq!(i.group(), 0xd);
        assert_eq!(i.addr, 0x12f);
        assert_eq!(i.imm, 0x2f);
        assert_eq!(i.nibble, 0xf);
        assert_eq!(i.x, 0x1);
        assert_eq!(i.y, 0x2);
    }

    #[test]
    fn test_decode_is_total() {
        // 8AB9 means nothing, it still decodes
        for opcode in [0x0000u16, 0xffff, 0x8ab9, 0x8006] {
            let i = Instruction::from(opcode);
            assert_eq!(i.opcode, opcode);
            assert!(i.x < 16 && i.y < 16 && i.nibble < 16);
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(Instruction::decode(0x00e0).describe(), "Clear screen");
        assert_eq!(
            Instruction::decode(0x1234).describe(),
            "Jump to address 0x0234"
        );
        assert_eq!(Instruction::decode(0x7a01).describe(), "Set VA += 0x01");
        assert_eq!(
            Instruction::decode(0x8ab9).describe(),
            "Unimplemented opcode"
        );
        assert_eq!(
            Instruction::decode(0xf30a).to_string(),
            "F30A Wait for a key, store it in V3"
        );
    }
}
