//! The disassembler (§4.5), sharing the opcode table with the executor.
//!
//! Grounded in `nes-frontend/src/instructions.rs`'s `decode_instructions()`,
//! which walks a program counter through `OPCODE_STRING_TABLE`/
//! `ADDRESSING_MODE_TABLE` and formats each addressing mode — adapted here
//! from a live debugger-window helper into two standalone range/count
//! APIs, and extended with the 65C02 zero-page-indirect mode the
//! teacher's NES-era table never needed. Both walk `Memory::as_bytes`'s
//! read-only view directly instead of reentering `Memory::read` once per
//! byte.

use crate::cpu::addressing::Mode;
use crate::error::CpuError;
use crate::memory::Memory;
use crate::opcodes::opcode_table;
use crate::types::Addr;

/// One decoded instruction: its address, raw bytes, and formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledLine {
    pub address: Addr,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Disassembles every instruction starting at `start` up to (but not
/// including) `end`. The final instruction may read past `end` if its
/// operand straddles the boundary; callers that want a hard byte cutoff
/// should pass an `end` that accounts for the longest instruction (3
/// bytes).
pub fn disassemble_range(
    memory: &mut dyn Memory,
    start: Addr,
    end: Addr,
) -> Result<Vec<DisassembledLine>, CpuError> {
    if end.0 <= start.0 {
        return Err(CpuError::InvalidRange {
            start: start.0,
            end: end.0,
        });
    }

    let view = memory.as_bytes();
    let mut lines = Vec::new();
    let mut pc = start.0;

    while pc < end.0 {
        let (line, next_pc) = decode_one(view, pc);
        lines.push(line);
        pc = next_pc;
    }

    Ok(lines)
}

/// Disassembles exactly `count` instructions starting at `start`,
/// reading past the caller's intended region if the last instruction's
/// operand straddles it. Pairs with [`disassemble_range`]'s byte-bounded
/// walk as the instruction-count-bounded alternative.
pub fn disassemble_count(memory: &mut dyn Memory, start: Addr, count: u32) -> Vec<DisassembledLine> {
    let view = memory.as_bytes();
    let mut lines = Vec::with_capacity(count as usize);
    let mut pc = start.0;

    for _ in 0..count {
        let (line, next_pc) = decode_one(view, pc);
        lines.push(line);
        pc = next_pc;
    }

    lines
}

fn decode_one(view: &[u8], pc: u32) -> (DisassembledLine, u32) {
    let table = opcode_table();
    let address = Addr(pc);
    let opcode = view.get(pc as usize).copied().unwrap_or(0);
    let entry = &table[opcode as usize];
    let operand_len = entry.mode.operand_len() as u32;

    let mut bytes = Vec::with_capacity(1 + operand_len as usize);
    bytes.push(opcode);
    for i in 0..operand_len {
        bytes.push(view.get((pc + 1 + i) as usize).copied().unwrap_or(0));
    }

    let text = format_instruction(entry.mnemonic.as_str(), entry.mode, pc, &bytes);
    (
        DisassembledLine {
            address,
            bytes,
            text,
        },
        pc + 1 + operand_len,
    )
}

fn format_instruction(mnemonic: &str, mode: Mode, instruction_addr: u32, bytes: &[u8]) -> String {
    let operand = match mode {
        Mode::Implied => String::new(),
        Mode::Accumulator => "A".to_string(),
        Mode::Immediate => format!("#${:02X}", bytes[1]),
        Mode::ZeroPage => format!("${:02X}", bytes[1]),
        Mode::ZeroPageX => format!("${:02X},X", bytes[1]),
        Mode::ZeroPageY => format!("${:02X},Y", bytes[1]),
        Mode::ZeroPageIndirect => format!("(${:02X})", bytes[1]),
        Mode::Absolute => format!("${:04X}", u16::from_le_bytes([bytes[1], bytes[2]])),
        Mode::AbsoluteX => format!("${:04X},X", u16::from_le_bytes([bytes[1], bytes[2]])),
        Mode::AbsoluteY => format!("${:04X},Y", u16::from_le_bytes([bytes[1], bytes[2]])),
        Mode::Indirect => format!("(${:04X})", u16::from_le_bytes([bytes[1], bytes[2]])),
        Mode::IndirectX => format!("(${:02X},X)", bytes[1]),
        Mode::IndirectY => format!("(${:02X}),Y", bytes[1]),
        Mode::Relative => {
            let offset = bytes[1] as i8;
            let target = (instruction_addr as i64 + 2 + offset as i64) as u16;
            format!("${:04X}", target)
        }
    };

    if operand.is_empty() {
        mnemonic.to_string()
    } else {
        format!("{mnemonic} {operand}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    #[test]
    fn disassembles_immediate_and_absolute_instructions() {
        let mut mem = FlatMemory::new(0x10000);
        mem.write(Addr(0x0200), 0xA9); // LDA #$10
        mem.write(Addr(0x0201), 0x10);
        mem.write(Addr(0x0202), 0x8D); // STA $2000
        mem.write(Addr(0x0203), 0x00);
        mem.write(Addr(0x0204), 0x20);

        let lines = disassemble_range(&mut mem, Addr(0x0200), Addr(0x0205)).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "LDA #$10");
        assert_eq!(lines[1].text, "STA $2000");
    }

    #[test]
    fn relative_branch_formats_as_absolute_target() {
        let mut mem = FlatMemory::new(0x10000);
        mem.write(Addr(0x0300), 0xF0); // BEQ $0305
        mem.write(Addr(0x0301), 0x03);

        let lines = disassemble_range(&mut mem, Addr(0x0300), Addr(0x0302)).unwrap();
        assert_eq!(lines[0].text, "BEQ $0305");
    }

    #[test]
    fn invalid_range_is_rejected() {
        let mut mem = FlatMemory::new(0x10000);
        let result = disassemble_range(&mut mem, Addr(0x10), Addr(0x10));
        assert!(matches!(result, Err(CpuError::InvalidRange { .. })));
    }

    #[test]
    fn disassemble_count_stops_after_the_requested_instructions() {
        let mut mem = FlatMemory::new(0x10000);
        mem.write(Addr(0x0400), 0xA9); // LDA #$01
        mem.write(Addr(0x0401), 0x01);
        mem.write(Addr(0x0402), 0xEA); // NOP
        mem.write(Addr(0x0403), 0x00); // BRK (not reached)

        let lines = disassemble_count(&mut mem, Addr(0x0400), 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "LDA #$01");
        assert_eq!(lines[1].text, "NOP");
    }
}
