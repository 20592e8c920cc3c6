//! Processor status register.
//!
//! The teacher represents status bits as a `StatusFlag` enum consumed by
//! `set_status_flag`/`is_status_flag_set` bit-twiddling helpers
//! (`cpu-6502/src/cpu_6502.rs`). `bitflags` gives the same bit-per-flag
//! model with typed set/clear/contains operations instead of hand-rolled
//! masks, matching the crate's corpus-wide preference for `bitflags` on
//! 6502-family status registers (`other_examples` manifests for
//! `patricktcoakley-ull` and `valerino-rv6502emu` both depend on it).

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// The 8-bit `P` register. Bit 5 (`UNUSED`) has no CPU-visible effect
    /// but is always read back as 1 and is pushed/pulled like any other
    /// bit, per spec.md's DATA MODEL entry for `ProcessorStatus`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProcessorStatus: u8 {
        const CARRY       = 0b0000_0001;
        const ZERO        = 0b0000_0010;
        const IRQ_DISABLE = 0b0000_0100;
        const DECIMAL     = 0b0000_1000;
        const BREAK       = 0b0001_0000;
        const UNUSED      = 0b0010_0000;
        const OVERFLOW    = 0b0100_0000;
        const NEGATIVE    = 0b1000_0000;
    }
}

impl ProcessorStatus {
    /// Power-on/reset value: interrupts disabled, unused bit set, all
    /// else clear.
    pub fn power_on() -> ProcessorStatus {
        ProcessorStatus::IRQ_DISABLE | ProcessorStatus::UNUSED
    }

    pub fn set_flag(&mut self, flag: ProcessorStatus, value: bool) {
        self.set(flag, value);
    }

    pub fn carry(self) -> bool {
        self.contains(ProcessorStatus::CARRY)
    }

    pub fn carry_bit(self) -> u8 {
        self.carry() as u8
    }

    /// Sets ZERO and NEGATIVE from `value`, the common post-ALU update
    /// shared by nearly every instruction primitive.
    pub fn update_zero_negative(&mut self, value: u8) {
        self.set(ProcessorStatus::ZERO, value == 0);
        self.set(ProcessorStatus::NEGATIVE, value & 0x80 != 0);
    }

    /// Byte pushed to the stack by PHP/BRK/IRQ/NMI: bit 4 (BREAK) is set
    /// for PHP/BRK and clear for a hardware IRQ/NMI push, per spec.md §4.4.
    pub fn to_pushed_byte(self, is_software_break: bool) -> u8 {
        let mut bits = self | ProcessorStatus::UNUSED;
        bits.set(ProcessorStatus::BREAK, is_software_break);
        bits.bits()
    }
}

impl fmt::Display for ProcessorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = [
            (ProcessorStatus::NEGATIVE, 'N'),
            (ProcessorStatus::OVERFLOW, 'V'),
            (ProcessorStatus::UNUSED, 'U'),
            (ProcessorStatus::BREAK, 'B'),
            (ProcessorStatus::DECIMAL, 'D'),
            (ProcessorStatus::IRQ_DISABLE, 'I'),
            (ProcessorStatus::ZERO, 'Z'),
            (ProcessorStatus::CARRY, 'C'),
        ];
        for (flag, letter) in letters {
            let ch = if self.contains(flag) {
                letter
            } else {
                '-'
            };
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_sets_irq_disable_and_unused() {
        let p = ProcessorStatus::power_on();
        assert!(p.contains(ProcessorStatus::IRQ_DISABLE));
        assert!(p.contains(ProcessorStatus::UNUSED));
        assert!(!p.contains(ProcessorStatus::CARRY));
    }

    #[test]
    fn update_zero_negative_tracks_both_flags() {
        let mut p = ProcessorStatus::empty();
        p.update_zero_negative(0);
        assert!(p.contains(ProcessorStatus::ZERO));
        assert!(!p.contains(ProcessorStatus::NEGATIVE));

        p.update_zero_negative(0x80);
        assert!(!p.contains(ProcessorStatus::ZERO));
        assert!(p.contains(ProcessorStatus::NEGATIVE));
    }

    #[test]
    fn pushed_byte_distinguishes_software_and_hardware_break() {
        let p = ProcessorStatus::power_on();
        let software = p.to_pushed_byte(true);
        let hardware = p.to_pushed_byte(false);
        assert_eq!(software & 0b0001_0000, 0b0001_0000);
        assert_eq!(hardware & 0b0001_0000, 0);
    }
}
