//! The 256-entry decoded opcode table (§4.3), shared by the execution
//! driver and the disassembler.
//!
//! Grounded in the teacher's parallel `CYCLES_TABLE`/`ADDRESSING_MODE_TABLE`/
//! `OPCODE_STRING_TABLE`/`OPERATION_FN_TABLE` arrays (`src/opcodes.rs`),
//! collapsed here into one `[OpcodeEntry; 256]` built from a single
//! declarative list instead of four hand-aligned parallel arrays — the
//! teacher's split long predates the 65C02's larger instruction set and
//! the four tables are simple enough to merge without losing the
//! "build a flat table once" idiom. Unassigned 65C02 slots decode with
//! the sentinel `Mnemonic::None` so disassembly can tell a genuinely
//! unassigned opcode apart from a real `NOP` ($EA), while still
//! *executing* as a one-cycle-longer no-op, per spec.md's explicit
//! Non-goal on illegal-opcode emulation. The Rockwell-only bit
//! instructions (`RMBn`/`SMBn`/`BBRn`/`BBSn`) and the 65C02's
//! absolute-indexed-indirect `JMP ($nnnn,X)` are out of scope; see
//! DESIGN.md.

use crate::cpu::addressing::{AccessKind, Mode, Operand};
use crate::cpu::ops;
use crate::cpu::Cpu;
use crate::memory::Memory;
use std::sync::OnceLock;

pub(crate) type OperationFn = fn(&mut Cpu, &mut dyn Memory, Operand) -> u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    /// Sentinel for an opcode byte with no assigned instruction. Executes
    /// as a one-cycle-longer no-op but disassembles distinctly from a
    /// real `NOP`.
    None,
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Phx, Phy, Pla, Plp,
    Plx, Ply, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stp, Stx, Sty,
    Stz, Tax, Tay, Trb, Tsb, Tsx, Txa, Txs, Tya, Wai,
}

impl Mnemonic {
    pub fn as_str(self) -> &'static str {
        use Mnemonic::*;
        match self {
            None => "???",
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Bra => "BRA", Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC",
            Cld => "CLD", Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX",
            Cpy => "CPY", Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR",
            Inc => "INC", Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR",
            Lda => "LDA", Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP",
            Ora => "ORA", Pha => "PHA", Php => "PHP", Phx => "PHX", Phy => "PHY",
            Pla => "PLA", Plp => "PLP", Plx => "PLX", Ply => "PLY", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stp => "STP", Stx => "STX",
            Sty => "STY", Stz => "STZ", Tax => "TAX", Tay => "TAY", Trb => "TRB",
            Tsb => "TSB", Tsx => "TSX", Txa => "TXA", Txs => "TXS", Tya => "TYA",
            Wai => "WAI",
        }
    }
}

#[derive(Clone, Copy)]
pub struct OpcodeEntry {
    pub mnemonic: Mnemonic,
    pub mode: Mode,
    pub access: AccessKind,
    pub base_cycles: u8,
    pub(crate) handler: OperationFn,
}

macro_rules! table {
    ( $( ($opcode:literal, $mnemonic:ident, $mode:ident, $cycles:literal, $access:ident, $handler:path) ),* $(,)? ) => {
        fn build() -> [OpcodeEntry; 256] {
            let mut table = [OpcodeEntry {
                mnemonic: Mnemonic::None,
                mode: Mode::Implied,
                access: AccessKind::Read,
                base_cycles: 2,
                handler: ops::nop,
            }; 256];
            $(
                table[$opcode as usize] = OpcodeEntry {
                    mnemonic: Mnemonic::$mnemonic,
                    mode: Mode::$mode,
                    access: AccessKind::$access,
                    base_cycles: $cycles,
                    handler: $handler,
                };
            )*
            table
        }
    };
}

table! {
    (0x00, Brk, Implied, 7, Read, ops::brk),
    (0x01, Ora, IndirectX, 6, Read, ops::ora),
    (0x04, Tsb, ZeroPage, 5, Write, ops::tsb),
    (0x05, Ora, ZeroPage, 3, Read, ops::ora),
    (0x06, Asl, ZeroPage, 5, Write, ops::asl),
    (0x08, Php, Implied, 3, Read, ops::php),
    (0x09, Ora, Immediate, 2, Read, ops::ora),
    (0x0A, Asl, Accumulator, 2, Read, ops::asl),
    (0x0C, Tsb, Absolute, 6, Write, ops::tsb),
    (0x0D, Ora, Absolute, 4, Read, ops::ora),
    (0x0E, Asl, Absolute, 6, Write, ops::asl),
    (0x10, Bpl, Relative, 2, Read, ops::bpl),
    (0x11, Ora, IndirectY, 5, Read, ops::ora),
    (0x12, Ora, ZeroPageIndirect, 5, Read, ops::ora),
    (0x14, Trb, ZeroPage, 5, Write, ops::trb),
    (0x15, Ora, ZeroPageX, 4, Read, ops::ora),
    (0x16, Asl, ZeroPageX, 6, Write, ops::asl),
    (0x18, Clc, Implied, 2, Read, ops::clc),
    (0x19, Ora, AbsoluteY, 4, Read, ops::ora),
    (0x1A, Inc, Accumulator, 2, Read, ops::inc),
    (0x1C, Trb, Absolute, 6, Write, ops::trb),
    (0x1D, Ora, AbsoluteX, 4, Read, ops::ora),
    (0x1E, Asl, AbsoluteX, 6, Write, ops::asl),
    (0x20, Jsr, Absolute, 6, Read, ops::jsr),
    (0x21, And, IndirectX, 6, Read, ops::and),
    (0x24, Bit, ZeroPage, 3, Read, ops::bit),
    (0x25, And, ZeroPage, 3, Read, ops::and),
    (0x26, Rol, ZeroPage, 5, Write, ops::rol),
    (0x28, Plp, Implied, 4, Read, ops::plp),
    (0x29, And, Immediate, 2, Read, ops::and),
    (0x2A, Rol, Accumulator, 2, Read, ops::rol),
    (0x2C, Bit, Absolute, 4, Read, ops::bit),
    (0x2D, And, Absolute, 4, Read, ops::and),
    (0x2E, Rol, Absolute, 6, Write, ops::rol),
    (0x30, Bmi, Relative, 2, Read, ops::bmi),
    (0x31, And, IndirectY, 5, Read, ops::and),
    (0x32, And, ZeroPageIndirect, 5, Read, ops::and),
    (0x34, Bit, ZeroPageX, 4, Read, ops::bit),
    (0x35, And, ZeroPageX, 4, Read, ops::and),
    (0x36, Rol, ZeroPageX, 6, Write, ops::rol),
    (0x38, Sec, Implied, 2, Read, ops::sec),
    (0x39, And, AbsoluteY, 4, Read, ops::and),
    (0x3A, Dec, Accumulator, 2, Read, ops::dec),
    (0x3C, Bit, AbsoluteX, 4, Read, ops::bit),
    (0x3D, And, AbsoluteX, 4, Read, ops::and),
    (0x3E, Rol, AbsoluteX, 6, Write, ops::rol),
    (0x40, Rti, Implied, 6, Read, ops::rti),
    (0x41, Eor, IndirectX, 6, Read, ops::eor),
    (0x45, Eor, ZeroPage, 3, Read, ops::eor),
    (0x46, Lsr, ZeroPage, 5, Write, ops::lsr),
    (0x48, Pha, Implied, 3, Read, ops::pha),
    (0x49, Eor, Immediate, 2, Read, ops::eor),
    (0x4A, Lsr, Accumulator, 2, Read, ops::lsr),
    (0x4C, Jmp, Absolute, 3, Read, ops::jmp),
    (0x4D, Eor, Absolute, 4, Read, ops::eor),
    (0x4E, Lsr, Absolute, 6, Write, ops::lsr),
    (0x50, Bvc, Relative, 2, Read, ops::bvc),
    (0x51, Eor, IndirectY, 5, Read, ops::eor),
    (0x52, Eor, ZeroPageIndirect, 5, Read, ops::eor),
    (0x55, Eor, ZeroPageX, 4, Read, ops::eor),
    (0x56, Lsr, ZeroPageX, 6, Write, ops::lsr),
    (0x58, Cli, Implied, 2, Read, ops::cli),
    (0x59, Eor, AbsoluteY, 4, Read, ops::eor),
    (0x5A, Phy, Implied, 3, Read, ops::phy),
    (0x5D, Eor, AbsoluteX, 4, Read, ops::eor),
    (0x5E, Lsr, AbsoluteX, 6, Write, ops::lsr),
    (0x60, Rts, Implied, 6, Read, ops::rts),
    (0x61, Adc, IndirectX, 6, Read, ops::adc),
    (0x65, Adc, ZeroPage, 3, Read, ops::adc),
    (0x66, Ror, ZeroPage, 5, Write, ops::ror),
    (0x68, Pla, Implied, 4, Read, ops::pla),
    (0x69, Adc, Immediate, 2, Read, ops::adc),
    (0x6A, Ror, Accumulator, 2, Read, ops::ror),
    (0x6C, Jmp, Indirect, 5, Read, ops::jmp),
    (0x6D, Adc, Absolute, 4, Read, ops::adc),
    (0x6E, Ror, Absolute, 6, Write, ops::ror),
    (0x70, Bvs, Relative, 2, Read, ops::bvs),
    (0x71, Adc, IndirectY, 5, Read, ops::adc),
    (0x72, Adc, ZeroPageIndirect, 5, Read, ops::adc),
    (0x75, Adc, ZeroPageX, 4, Read, ops::adc),
    (0x76, Ror, ZeroPageX, 6, Write, ops::ror),
    (0x78, Sei, Implied, 2, Read, ops::sei),
    (0x79, Adc, AbsoluteY, 4, Read, ops::adc),
    (0x7A, Ply, Implied, 4, Read, ops::ply),
    (0x7D, Adc, AbsoluteX, 4, Read, ops::adc),
    (0x7E, Ror, AbsoluteX, 6, Write, ops::ror),
    (0x80, Bra, Relative, 2, Read, ops::bra),
    (0x81, Sta, IndirectX, 6, Write, ops::sta),
    (0x84, Sty, ZeroPage, 3, Write, ops::sty),
    (0x85, Sta, ZeroPage, 3, Write, ops::sta),
    (0x86, Stx, ZeroPage, 3, Write, ops::stx),
    (0x88, Dey, Implied, 2, Read, ops::dey),
    (0x89, Bit, Immediate, 2, Read, ops::bit_immediate),
    (0x8A, Txa, Implied, 2, Read, ops::txa),
    (0x8C, Sty, Absolute, 4, Write, ops::sty),
    (0x8D, Sta, Absolute, 4, Write, ops::sta),
    (0x8E, Stx, Absolute, 4, Write, ops::stx),
    (0x90, Bcc, Relative, 2, Read, ops::bcc),
    (0x91, Sta, IndirectY, 5, Write, ops::sta),
    (0x92, Sta, ZeroPageIndirect, 5, Write, ops::sta),
    (0x94, Sty, ZeroPageX, 4, Write, ops::sty),
    (0x95, Sta, ZeroPageX, 4, Write, ops::sta),
    (0x96, Stx, ZeroPageY, 4, Write, ops::stx),
    (0x98, Tya, Implied, 2, Read, ops::tya),
    (0x99, Sta, AbsoluteY, 4, Write, ops::sta),
    (0x9A, Txs, Implied, 2, Read, ops::txs),
    (0x9C, Stz, Absolute, 4, Write, ops::stz),
    (0x9D, Sta, AbsoluteX, 4, Write, ops::sta),
    (0x9E, Stz, AbsoluteX, 4, Write, ops::stz),
    (0xA0, Ldy, Immediate, 2, Read, ops::ldy),
    (0xA1, Lda, IndirectX, 6, Read, ops::lda),
    (0xA2, Ldx, Immediate, 2, Read, ops::ldx),
    (0xA4, Ldy, ZeroPage, 3, Read, ops::ldy),
    (0xA5, Lda, ZeroPage, 3, Read, ops::lda),
    (0xA6, Ldx, ZeroPage, 3, Read, ops::ldx),
    (0xA8, Tay, Implied, 2, Read, ops::tay),
    (0xA9, Lda, Immediate, 2, Read, ops::lda),
    (0xAA, Tax, Implied, 2, Read, ops::tax),
    (0xAC, Ldy, Absolute, 4, Read, ops::ldy),
    (0xAD, Lda, Absolute, 4, Read, ops::lda),
    (0xAE, Ldx, Absolute, 4, Read, ops::ldx),
    (0xB0, Bcs, Relative, 2, Read, ops::bcs),
    (0xB1, Lda, IndirectY, 5, Read, ops::lda),
    (0xB2, Lda, ZeroPageIndirect, 5, Read, ops::lda),
    (0xB4, Ldy, ZeroPageX, 4, Read, ops::ldy),
    (0xB5, Lda, ZeroPageX, 4, Read, ops::lda),
    (0xB6, Ldx, ZeroPageY, 4, Read, ops::ldx),
    (0xB8, Clv, Implied, 2, Read, ops::clv),
    (0xB9, Lda, AbsoluteY, 4, Read, ops::lda),
    (0xBA, Tsx, Implied, 2, Read, ops::tsx),
    (0xBC, Ldy, AbsoluteX, 4, Read, ops::ldy),
    (0xBD, Lda, AbsoluteX, 4, Read, ops::lda),
    (0xBE, Ldx, AbsoluteY, 4, Read, ops::ldx),
    (0xC0, Cpy, Immediate, 2, Read, ops::cpy),
    (0xC1, Cmp, IndirectX, 6, Read, ops::cmp),
    (0xC4, Cpy, ZeroPage, 3, Read, ops::cpy),
    (0xC5, Cmp, ZeroPage, 3, Read, ops::cmp),
    (0xC6, Dec, ZeroPage, 5, Write, ops::dec),
    (0xC8, Iny, Implied, 2, Read, ops::iny),
    (0xC9, Cmp, Immediate, 2, Read, ops::cmp),
    (0xCA, Dex, Implied, 2, Read, ops::dex),
    (0xCB, Wai, Implied, 3, Read, ops::wai),
    (0xCC, Cpy, Absolute, 4, Read, ops::cpy),
    (0xCD, Cmp, Absolute, 4, Read, ops::cmp),
    (0xCE, Dec, Absolute, 6, Write, ops::dec),
    (0xD0, Bne, Relative, 2, Read, ops::bne),
    (0xD1, Cmp, IndirectY, 5, Read, ops::cmp),
    (0xD2, Cmp, ZeroPageIndirect, 5, Read, ops::cmp),
    (0xD5, Cmp, ZeroPageX, 4, Read, ops::cmp),
    (0xD6, Dec, ZeroPageX, 6, Write, ops::dec),
    (0xD8, Cld, Implied, 2, Read, ops::cld),
    (0xD9, Cmp, AbsoluteY, 4, Read, ops::cmp),
    (0xDA, Phx, Implied, 3, Read, ops::phx),
    (0xDB, Stp, Implied, 3, Read, ops::stp),
    (0xDD, Cmp, AbsoluteX, 4, Read, ops::cmp),
    (0xDE, Dec, AbsoluteX, 6, Write, ops::dec),
    (0xE0, Cpx, Immediate, 2, Read, ops::cpx),
    (0xE1, Sbc, IndirectX, 6, Read, ops::sbc),
    (0xE4, Cpx, ZeroPage, 3, Read, ops::cpx),
    (0xE5, Sbc, ZeroPage, 3, Read, ops::sbc),
    (0xE6, Inc, ZeroPage, 5, Write, ops::inc),
    (0xE8, Inx, Implied, 2, Read, ops::inx),
    (0xE9, Sbc, Immediate, 2, Read, ops::sbc),
    (0xEA, Nop, Implied, 2, Read, ops::nop),
    (0xEC, Cpx, Absolute, 4, Read, ops::cpx),
    (0xED, Sbc, Absolute, 4, Read, ops::sbc),
    (0xEE, Inc, Absolute, 6, Write, ops::inc),
    (0xF0, Beq, Relative, 2, Read, ops::beq),
    (0xF1, Sbc, IndirectY, 5, Read, ops::sbc),
    (0xF2, Sbc, ZeroPageIndirect, 5, Read, ops::sbc),
    (0xF5, Sbc, ZeroPageX, 4, Read, ops::sbc),
    (0xF6, Inc, ZeroPageX, 6, Write, ops::inc),
    (0xF8, Sed, Implied, 2, Read, ops::sed),
    (0xF9, Sbc, AbsoluteY, 4, Read, ops::sbc),
    (0xFA, Plx, Implied, 4, Read, ops::plx),
    (0xFD, Sbc, AbsoluteX, 4, Read, ops::sbc),
    (0xFE, Inc, AbsoluteX, 6, Write, ops::inc),
}

static TABLE: OnceLock<[OpcodeEntry; 256]> = OnceLock::new();

/// Returns the shared, lazily-built 256-entry opcode table.
pub fn opcode_table() -> &'static [OpcodeEntry; 256] {
    TABLE.get_or_init(build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lda_immediate_decodes_correctly() {
        let table = opcode_table();
        let entry = &table[0xA9];
        assert_eq!(entry.mnemonic, Mnemonic::Lda);
        assert_eq!(entry.mode, Mode::Immediate);
        assert_eq!(entry.base_cycles, 2);
    }

    #[test]
    fn unassigned_slot_decodes_with_sentinel_mnemonic() {
        // Scenario 7 (spec.md §8): byte 0x02 decodes with sentinel-None
        // mnemonic, distinct from the real NOP at 0xEA.
        let table = opcode_table();
        let entry = &table[0x02];
        assert_eq!(entry.mnemonic, Mnemonic::None);
        assert_ne!(entry.mnemonic, table[0xEA].mnemonic);
        assert_eq!(entry.mnemonic.as_str(), "???");
    }

    #[test]
    fn indexed_write_base_cycles_reserve_room_for_unconditional_penalty() {
        // STA abs,X is fixed at 5 cycles total; base_cycles stores 4 so
        // the always-paid +1 from AccessKind::Write brings it to 5.
        let table = opcode_table();
        let entry = &table[0x9D];
        assert_eq!(entry.base_cycles, 4);
        assert_eq!(entry.access, AccessKind::Write);
    }
}
