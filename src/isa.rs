use std::fmt;

/// Every instruction the LS-8 understands.
///
/// Opcodes follow the `AABCDDDD` layout:
/// - `AA`: number of operand bytes following the opcode
/// - `B`: instruction is handled by the ALU
/// - `C`: instruction sets the program counter itself
/// - `DDDD`: instruction identifier
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Set register A to the immediate value B
    LDI = 0b1000_0010,
    /// Print register A as a decimal integer
    PRN = 0b0100_0111,
    /// Halt the CPU
    HLT = 0b0000_0001,
    ADD = 0b1010_0000,
    SUB = 0b1010_0001,
    MUL = 0b1010_0010,
    DIV = 0b1010_0011,
    /// Push register A onto the stack
    PUSH = 0b0100_0101,
    /// Pop the top of the stack into register A
    POP = 0b0100_0110,
    /// Push the return address and jump to the address in register A
    CALL = 0b0101_0000,
    /// Pop the return address into PC
    RET = 0b0001_0001,
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::LDI,
        Opcode::PRN,
        Opcode::HLT,
        Opcode::ADD,
        Opcode::SUB,
        Opcode::MUL,
        Opcode::DIV,
        Opcode::PUSH,
        Opcode::POP,
        Opcode::CALL,
        Opcode::RET,
    ];

    const ALU_BIT: u8 = 0b0010_0000;
    const SETS_PC_BIT: u8 = 0b0001_0000;

    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Operand bytes which follow the opcode in memory.
    #[inline]
    pub const fn operand_count(self) -> u8 {
        self.byte() >> 6
    }

    /// Total bytes taken by the instruction, including the opcode.
    #[inline]
    pub const fn width(self) -> u8 {
        self.operand_count() + 1
    }

    #[inline]
    pub const fn is_alu(self) -> bool {
        self.byte() & Self::ALU_BIT != 0
    }

    #[inline]
    pub const fn sets_pc(self) -> bool {
        self.byte() & Self::SETS_PC_BIT != 0
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::LDI => "LDI",
            Opcode::PRN => "PRN",
            Opcode::HLT => "HLT",
            Opcode::ADD => "ADD",
            Opcode::SUB => "SUB",
            Opcode::MUL => "MUL",
            Opcode::DIV => "DIV",
            Opcode::PUSH => "PUSH",
            Opcode::POP => "POP",
            Opcode::CALL => "CALL",
            Opcode::RET => "RET",
        }
    }
}

impl TryFrom<u8> for Opcode {
    /// The byte that failed to decode
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.byte() == byte)
            .ok_or(byte)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_opcode() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.byte()), Ok(op));
        }
        assert_eq!(Opcode::try_from(0b1111_1111), Err(0b1111_1111));
        assert_eq!(Opcode::try_from(0x00), Err(0x00));
    }

    #[test]
    fn width_from_encoding() {
        #[rustfmt::skip]
        let cases = [
            (Opcode::LDI, 3), (Opcode::PRN, 2), (Opcode::HLT, 1),
            (Opcode::ADD, 3), (Opcode::SUB, 3), (Opcode::MUL, 3), (Opcode::DIV, 3),
            (Opcode::PUSH, 2), (Opcode::POP, 2), (Opcode::CALL, 2), (Opcode::RET, 1),
        ];
        for (op, width) in cases {
            assert_eq!(op.width(), width, "width of {op}");
        }
    }

    #[test]
    fn flags_from_encoding() {
        let alu: Vec<_> = Opcode::ALL.into_iter().filter(|op| op.is_alu()).collect();
        assert_eq!(alu, [Opcode::ADD, Opcode::SUB, Opcode::MUL, Opcode::DIV]);

        let sets_pc: Vec<_> = Opcode::ALL.into_iter().filter(|op| op.sets_pc()).collect();
        assert_eq!(sets_pc, [Opcode::CALL, Opcode::RET]);
    }
}
