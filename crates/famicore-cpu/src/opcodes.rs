//! Opcode decode tables.
//!
//! The 6502 opcode space is sparse: 151 of the 256 byte values are
//! official instructions. The table below also decodes the documented
//! unofficial NOP family (1-, 2- and 3-byte NOPs with their canonical
//! cycle counts); every other unofficial opcode decodes to `None` and is
//! treated as a fatal fault by the interpreter.

use crate::addressing::AddrMode;

/// Instruction mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // Names are the 6502 mnemonics themselves.
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Mnemonic {
    /// Three-letter assembly name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adc => "ADC", Self::And => "AND", Self::Asl => "ASL",
            Self::Bcc => "BCC", Self::Bcs => "BCS", Self::Beq => "BEQ",
            Self::Bit => "BIT", Self::Bmi => "BMI", Self::Bne => "BNE",
            Self::Bpl => "BPL", Self::Brk => "BRK", Self::Bvc => "BVC",
            Self::Bvs => "BVS", Self::Clc => "CLC", Self::Cld => "CLD",
            Self::Cli => "CLI", Self::Clv => "CLV", Self::Cmp => "CMP",
            Self::Cpx => "CPX", Self::Cpy => "CPY", Self::Dec => "DEC",
            Self::Dex => "DEX", Self::Dey => "DEY", Self::Eor => "EOR",
            Self::Inc => "INC", Self::Inx => "INX", Self::Iny => "INY",
            Self::Jmp => "JMP", Self::Jsr => "JSR", Self::Lda => "LDA",
            Self::Ldx => "LDX", Self::Ldy => "LDY", Self::Lsr => "LSR",
            Self::Nop => "NOP", Self::Ora => "ORA", Self::Pha => "PHA",
            Self::Php => "PHP", Self::Pla => "PLA", Self::Plp => "PLP",
            Self::Rol => "ROL", Self::Ror => "ROR", Self::Rti => "RTI",
            Self::Rts => "RTS", Self::Sbc => "SBC", Self::Sec => "SEC",
            Self::Sed => "SED", Self::Sei => "SEI", Self::Sta => "STA",
            Self::Stx => "STX", Self::Sty => "STY", Self::Tax => "TAX",
            Self::Tay => "TAY", Self::Tsx => "TSX", Self::Txa => "TXA",
            Self::Txs => "TXS", Self::Tya => "TYA",
        }
    }
}

/// One decoded opcode: mnemonic, addressing mode, base cycles, and
/// whether an operand page crossing adds a cycle (read instructions on
/// AbsoluteX/AbsoluteY/IndirectY only).
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Instruction mnemonic.
    pub mnemonic: Mnemonic,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count before penalties.
    pub cycles: u8,
    /// Page-cross penalty applies.
    pub page_penalty: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddrMode, cycles: u8, page_penalty: bool) -> Option<OpcodeInfo> {
    Some(OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        page_penalty,
    })
}

/// Decode one opcode byte.
#[allow(clippy::too_many_lines)] // One arm per opcode value.
const fn decode(opcode: u8) -> Option<OpcodeInfo> {
    use AddrMode::{
        Absolute, AbsoluteX, AbsoluteY, Accumulator, Immediate, Implied, Indirect, IndirectX,
        IndirectY, Relative, ZeroPage, ZeroPageX, ZeroPageY,
    };
    use Mnemonic::{
        Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp,
        Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha,
        Php, Pla, Plp, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa,
        Txs, Tya,
    };

    match opcode {
        // ADC
        0x69 => op(Adc, Immediate, 2, false),
        0x65 => op(Adc, ZeroPage, 3, false),
        0x75 => op(Adc, ZeroPageX, 4, false),
        0x6D => op(Adc, Absolute, 4, false),
        0x7D => op(Adc, AbsoluteX, 4, true),
        0x79 => op(Adc, AbsoluteY, 4, true),
        0x61 => op(Adc, IndirectX, 6, false),
        0x71 => op(Adc, IndirectY, 5, true),

        // AND
        0x29 => op(And, Immediate, 2, false),
        0x25 => op(And, ZeroPage, 3, false),
        0x35 => op(And, ZeroPageX, 4, false),
        0x2D => op(And, Absolute, 4, false),
        0x3D => op(And, AbsoluteX, 4, true),
        0x39 => op(And, AbsoluteY, 4, true),
        0x21 => op(And, IndirectX, 6, false),
        0x31 => op(And, IndirectY, 5, true),

        // ASL
        0x0A => op(Asl, Accumulator, 2, false),
        0x06 => op(Asl, ZeroPage, 5, false),
        0x16 => op(Asl, ZeroPageX, 6, false),
        0x0E => op(Asl, Absolute, 6, false),
        0x1E => op(Asl, AbsoluteX, 7, false),

        // Branches
        0x90 => op(Bcc, Relative, 2, false),
        0xB0 => op(Bcs, Relative, 2, false),
        0xF0 => op(Beq, Relative, 2, false),
        0x30 => op(Bmi, Relative, 2, false),
        0xD0 => op(Bne, Relative, 2, false),
        0x10 => op(Bpl, Relative, 2, false),
        0x50 => op(Bvc, Relative, 2, false),
        0x70 => op(Bvs, Relative, 2, false),

        // BIT
        0x24 => op(Bit, ZeroPage, 3, false),
        0x2C => op(Bit, Absolute, 4, false),

        // BRK
        0x00 => op(Brk, Implied, 7, false),

        // Flag operations
        0x18 => op(Clc, Implied, 2, false),
        0xD8 => op(Cld, Implied, 2, false),
        0x58 => op(Cli, Implied, 2, false),
        0xB8 => op(Clv, Implied, 2, false),
        0x38 => op(Sec, Implied, 2, false),
        0xF8 => op(Sed, Implied, 2, false),
        0x78 => op(Sei, Implied, 2, false),

        // CMP
        0xC9 => op(Cmp, Immediate, 2, false),
        0xC5 => op(Cmp, ZeroPage, 3, false),
        0xD5 => op(Cmp, ZeroPageX, 4, false),
        0xCD => op(Cmp, Absolute, 4, false),
        0xDD => op(Cmp, AbsoluteX, 4, true),
        0xD9 => op(Cmp, AbsoluteY, 4, true),
        0xC1 => op(Cmp, IndirectX, 6, false),
        0xD1 => op(Cmp, IndirectY, 5, true),

        // CPX / CPY
        0xE0 => op(Cpx, Immediate, 2, false),
        0xE4 => op(Cpx, ZeroPage, 3, false),
        0xEC => op(Cpx, Absolute, 4, false),
        0xC0 => op(Cpy, Immediate, 2, false),
        0xC4 => op(Cpy, ZeroPage, 3, false),
        0xCC => op(Cpy, Absolute, 4, false),

        // DEC / DEX / DEY
        0xC6 => op(Dec, ZeroPage, 5, false),
        0xD6 => op(Dec, ZeroPageX, 6, false),
        0xCE => op(Dec, Absolute, 6, false),
        0xDE => op(Dec, AbsoluteX, 7, false),
        0xCA => op(Dex, Implied, 2, false),
        0x88 => op(Dey, Implied, 2, false),

        // EOR
        0x49 => op(Eor, Immediate, 2, false),
        0x45 => op(Eor, ZeroPage, 3, false),
        0x55 => op(Eor, ZeroPageX, 4, false),
        0x4D => op(Eor, Absolute, 4, false),
        0x5D => op(Eor, AbsoluteX, 4, true),
        0x59 => op(Eor, AbsoluteY, 4, true),
        0x41 => op(Eor, IndirectX, 6, false),
        0x51 => op(Eor, IndirectY, 5, true),

        // INC / INX / INY
        0xE6 => op(Inc, ZeroPage, 5, false),
        0xF6 => op(Inc, ZeroPageX, 6, false),
        0xEE => op(Inc, Absolute, 6, false),
        0xFE => op(Inc, AbsoluteX, 7, false),
        0xE8 => op(Inx, Implied, 2, false),
        0xC8 => op(Iny, Implied, 2, false),

        // JMP / JSR
        0x4C => op(Jmp, Absolute, 3, false),
        0x6C => op(Jmp, Indirect, 5, false),
        0x20 => op(Jsr, Absolute, 6, false),

        // LDA
        0xA9 => op(Lda, Immediate, 2, false),
        0xA5 => op(Lda, ZeroPage, 3, false),
        0xB5 => op(Lda, ZeroPageX, 4, false),
        0xAD => op(Lda, Absolute, 4, false),
        0xBD => op(Lda, AbsoluteX, 4, true),
        0xB9 => op(Lda, AbsoluteY, 4, true),
        0xA1 => op(Lda, IndirectX, 6, false),
        0xB1 => op(Lda, IndirectY, 5, true),

        // LDX
        0xA2 => op(Ldx, Immediate, 2, false),
        0xA6 => op(Ldx, ZeroPage, 3, false),
        0xB6 => op(Ldx, ZeroPageY, 4, false),
        0xAE => op(Ldx, Absolute, 4, false),
        0xBE => op(Ldx, AbsoluteY, 4, true),

        // LDY
        0xA0 => op(Ldy, Immediate, 2, false),
        0xA4 => op(Ldy, ZeroPage, 3, false),
        0xB4 => op(Ldy, ZeroPageX, 4, false),
        0xAC => op(Ldy, Absolute, 4, false),
        0xBC => op(Ldy, AbsoluteX, 4, true),

        // LSR
        0x4A => op(Lsr, Accumulator, 2, false),
        0x46 => op(Lsr, ZeroPage, 5, false),
        0x56 => op(Lsr, ZeroPageX, 6, false),
        0x4E => op(Lsr, Absolute, 6, false),
        0x5E => op(Lsr, AbsoluteX, 7, false),

        // NOP (official)
        0xEA => op(Nop, Implied, 2, false),

        // ORA
        0x09 => op(Ora, Immediate, 2, false),
        0x05 => op(Ora, ZeroPage, 3, false),
        0x15 => op(Ora, ZeroPageX, 4, false),
        0x0D => op(Ora, Absolute, 4, false),
        0x1D => op(Ora, AbsoluteX, 4, true),
        0x19 => op(Ora, AbsoluteY, 4, true),
        0x01 => op(Ora, IndirectX, 6, false),
        0x11 => op(Ora, IndirectY, 5, true),

        // Stack
        0x48 => op(Pha, Implied, 3, false),
        0x08 => op(Php, Implied, 3, false),
        0x68 => op(Pla, Implied, 4, false),
        0x28 => op(Plp, Implied, 4, false),

        // ROL
        0x2A => op(Rol, Accumulator, 2, false),
        0x26 => op(Rol, ZeroPage, 5, false),
        0x36 => op(Rol, ZeroPageX, 6, false),
        0x2E => op(Rol, Absolute, 6, false),
        0x3E => op(Rol, AbsoluteX, 7, false),

        // ROR
        0x6A => op(Ror, Accumulator, 2, false),
        0x66 => op(Ror, ZeroPage, 5, false),
        0x76 => op(Ror, ZeroPageX, 6, false),
        0x6E => op(Ror, Absolute, 6, false),
        0x7E => op(Ror, AbsoluteX, 7, false),

        // RTI / RTS
        0x40 => op(Rti, Implied, 6, false),
        0x60 => op(Rts, Implied, 6, false),

        // SBC
        0xE9 => op(Sbc, Immediate, 2, false),
        0xE5 => op(Sbc, ZeroPage, 3, false),
        0xF5 => op(Sbc, ZeroPageX, 4, false),
        0xED => op(Sbc, Absolute, 4, false),
        0xFD => op(Sbc, AbsoluteX, 4, true),
        0xF9 => op(Sbc, AbsoluteY, 4, true),
        0xE1 => op(Sbc, IndirectX, 6, false),
        0xF1 => op(Sbc, IndirectY, 5, true),

        // STA
        0x85 => op(Sta, ZeroPage, 3, false),
        0x95 => op(Sta, ZeroPageX, 4, false),
        0x8D => op(Sta, Absolute, 4, false),
        0x9D => op(Sta, AbsoluteX, 5, false),
        0x99 => op(Sta, AbsoluteY, 5, false),
        0x81 => op(Sta, IndirectX, 6, false),
        0x91 => op(Sta, IndirectY, 6, false),

        // STX / STY
        0x86 => op(Stx, ZeroPage, 3, false),
        0x96 => op(Stx, ZeroPageY, 4, false),
        0x8E => op(Stx, Absolute, 4, false),
        0x84 => op(Sty, ZeroPage, 3, false),
        0x94 => op(Sty, ZeroPageX, 4, false),
        0x8C => op(Sty, Absolute, 4, false),

        // Transfers
        0xAA => op(Tax, Implied, 2, false),
        0xA8 => op(Tay, Implied, 2, false),
        0xBA => op(Tsx, Implied, 2, false),
        0x8A => op(Txa, Implied, 2, false),
        0x9A => op(Txs, Implied, 2, false),
        0x98 => op(Tya, Implied, 2, false),

        // Unofficial NOP family (documented lengths and cycles).
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => op(Nop, Implied, 2, false),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => op(Nop, Immediate, 2, false),
        0x04 | 0x44 | 0x64 => op(Nop, ZeroPage, 3, false),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => op(Nop, ZeroPageX, 4, false),
        0x0C => op(Nop, Absolute, 4, false),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => op(Nop, AbsoluteX, 4, true),

        // Remaining unofficial opcodes are fatal.
        _ => None,
    }
}

/// 256-entry decode table indexed by opcode byte. `None` entries are
/// unimplemented unofficial opcodes.
pub static OPCODE_TABLE: [Option<OpcodeInfo>; 256] = {
    let mut table = [None; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
};
