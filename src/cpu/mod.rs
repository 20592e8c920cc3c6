//! The execution driver (§4.4): `Cpu`, its halt/interrupt state machine,
//! and the fetch-decode-execute loop.
//!
//! Grounded in the teacher's `Cpu6502` struct and `tick()` method
//! (`cpu-6502/src/cpu_6502.rs`), restructured so the CPU borrows a
//! `Memory` per call instead of owning a concrete `Bus`, per spec.md §6's
//! Non-goal that bus/device wiring is a collaborator's job. Stack helpers
//! (`push_stack_u8`/`pull_stack_u8`/…) and flag-update helpers
//! (`update_zero_and_negative_flag`, `update_carry_flag`,
//! `update_overflow_flag`) are carried over nearly verbatim in spirit,
//! generalized to work through the `Memory` trait instead of `self.bus`.

pub mod addressing;
pub(crate) mod ops;

use crate::debug::{DebugListener, InstructionTrace};
use crate::error::CpuError;
use crate::flags::ProcessorStatus;
use crate::memory::{vectors, Memory, STACK_PAGE};
use crate::opcodes::{opcode_table, OpcodeEntry};
use crate::registers::{RegisterWidth, Registers};
use crate::types::{Addr, Cycles};
use addressing::{resolve, Operand};

/// The halt/wait state a 65C02 core can be parked in, per spec.md §4.4's
/// state-machine table (`None | Brk-legacy | Wai | Stp` there; `Running`
/// here is the `None` case — `halted ⇔ halt_state != Running`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltState {
    /// Normal execution.
    Running,
    /// Kept for backward compatibility with an older source revision that
    /// halted the core on `BRK`. Nothing in this crate transitions into
    /// it — current `BRK` behavior is to push state, vector, and keep
    /// running — but spec.md's data model names it explicitly as a valid
    /// `CpuState` value a collaborator's save file may carry.
    BrkLegacy,
    /// Parked by `WAI`, resumes (without servicing, if interrupts are
    /// masked) the instant an IRQ or NMI is signaled.
    WaitingForInterrupt,
    /// Parked by `STP`; only a hardware reset clears this.
    Stopped,
}

/// A full snapshot of CPU-visible state, for `get_state`/`set_state`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: ProcessorStatus,
    pub pc: u16,
    pub cycles: Cycles,
    pub halt: HaltState,
    pub irq_pending: bool,
    pub nmi_pending: bool,
    pub stop_requested: bool,
}

/// The 65xx execution core. Holds registers, interrupt latches, halt
/// state, and at most one attached debug listener; does not own memory.
pub struct Cpu {
    regs: Registers,
    cycles: Cycles,
    halt: HaltState,
    irq_pending: bool,
    nmi_pending: bool,
    stop_requested: bool,
    listener: Option<Box<dyn DebugListener>>,
    opcodes: &'static [OpcodeEntry; 256],
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::new(RegisterWidth::Bits8),
            cycles: Cycles::ZERO,
            halt: HaltState::Running,
            irq_pending: false,
            nmi_pending: false,
            stop_requested: false,
            listener: None,
            opcodes: opcode_table(),
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn cycles(&self) -> Cycles {
        self.cycles
    }

    pub fn halt_state(&self) -> HaltState {
        self.halt
    }

    /// Reloads `pc` from the reset vector and restores power-on register
    /// state. Per the recorded Open Question decision, the cycle counter
    /// is **not** zeroed — a reset is a hardware event on an already
    /// running clock, not a fresh `Cpu::new()`.
    pub fn reset(&mut self, memory: &mut dyn Memory) {
        self.regs.reset();
        self.regs.pc = memory.read_word(vectors::RESET);
        self.halt = HaltState::Running;
        self.irq_pending = false;
        self.nmi_pending = false;
        self.stop_requested = false;
    }

    /// Edge-triggered IRQ latch: the line is sampled once here and
    /// serviced (or used to wake a `WAI`) on the next opportunity, per
    /// the recorded Open Question decision. A masked IRQ that arrives
    /// while `I` is set is *not* queued indefinitely — callers wanting
    /// a held line call this again once per assertion.
    pub fn signal_irq(&mut self) {
        self.irq_pending = true;
    }

    pub fn signal_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Requests that `STP`'s halt be lifted on the next `step`. Only a
    /// caller-driven reset ordinarily clears `Stopped`; this exists so a
    /// host environment can simulate an external reset button without
    /// going through the full `reset()` vector reload.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn clear_stop_request(&mut self) {
        self.stop_requested = false;
    }

    /// Attaches a debug listener. `None` fails fast with
    /// `CpuError::InvalidArgument`, per spec.md §7's "attach_debugger(null)
    /// fails fast" — since a plain `Box<dyn DebugListener>` argument could
    /// never exercise that failure path, this takes `Option` instead.
    pub fn attach_debugger(
        &mut self,
        listener: Option<Box<dyn DebugListener>>,
    ) -> Result<(), CpuError> {
        let listener = listener.ok_or_else(|| {
            CpuError::InvalidArgument("attach_debugger requires a non-null listener".to_string())
        })?;
        if self.listener.is_some() {
            return Err(CpuError::DebuggerAlreadyAttached);
        }
        log::debug!("debug listener attached");
        self.listener = Some(listener);
        Ok(())
    }

    pub fn detach_debugger(&mut self) -> Result<Box<dyn DebugListener>, CpuError> {
        log::debug!("debug listener detached");
        self.listener.take().ok_or(CpuError::NoDebuggerAttached)
    }

    pub fn get_state(&self) -> CpuState {
        CpuState {
            a: self.regs.a_u8(),
            x: self.regs.x_u8(),
            y: self.regs.y_u8(),
            sp: self.regs.sp,
            p: self.regs.p,
            pc: self.regs.pc,
            cycles: self.cycles,
            halt: self.halt,
            irq_pending: self.irq_pending,
            nmi_pending: self.nmi_pending,
            stop_requested: self.stop_requested,
        }
    }

    pub fn set_state(&mut self, state: CpuState) {
        self.regs.set_a(state.a as u16);
        self.regs.set_x(state.x as u16);
        self.regs.set_y(state.y as u16);
        self.regs.sp = state.sp;
        self.regs.p = state.p;
        self.regs.pc = state.pc;
        self.cycles = state.cycles;
        self.halt = state.halt;
        self.irq_pending = state.irq_pending;
        self.nmi_pending = state.nmi_pending;
        self.stop_requested = state.stop_requested;
    }

    /// Executes exactly one instruction (or one no-op tick while parked
    /// in `WaitingForInterrupt`/`Stopped`), servicing a pending
    /// NMI/IRQ first if one is latched. Returns the cycles consumed.
    pub fn step(&mut self, memory: &mut dyn Memory) -> Cycles {
        if self.nmi_pending {
            log::debug!("servicing pending NMI");
            self.nmi_pending = false;
            self.halt = HaltState::Running;
            let consumed = self.service_interrupt(memory, vectors::NMI, false);
            self.cycles += consumed;
            return Cycles(consumed);
        }

        if self.irq_pending && !self.regs.p.contains(ProcessorStatus::IRQ_DISABLE) {
            log::debug!("servicing pending IRQ");
            self.irq_pending = false;
            self.halt = HaltState::Running;
            let consumed = self.service_interrupt(memory, vectors::IRQ_BRK, false);
            self.cycles += consumed;
            return Cycles(consumed);
        }

        match self.halt {
            // Only `reset()` lifts STP, per spec.md §4.4's state-machine
            // table (`Stp | any except reset | Stp`); a stop-request does
            // not wake it.
            HaltState::Stopped | HaltState::BrkLegacy => {
                self.cycles += 1;
                return Cycles(1);
            }
            HaltState::WaitingForInterrupt => {
                if self.irq_pending || self.nmi_pending {
                    log::debug!("WAI resumed by a pending interrupt");
                    self.halt = HaltState::Running;
                }
                self.cycles += 1;
                return Cycles(1);
            }
            HaltState::Running => {}
        }

        let pc_before = self.regs.pc_addr();
        let opcode = self.fetch_u8(memory);
        let entry = &self.opcodes[opcode as usize];

        if let Some(listener) = self.listener.as_mut() {
            listener.on_before_step(pc_before, opcode);
        }

        let operand_start = self.regs.pc;
        let (operand, extra_addressing_cycles) =
            resolve(&mut self.regs, memory, entry.mode, entry.access);
        let operand_len = self.regs.pc.wrapping_sub(operand_start);
        let operand_bytes = (0..operand_len)
            .map(|i| memory.read(Addr::from(operand_start.wrapping_add(i))))
            .collect::<Vec<_>>();
        let effective_address = match operand {
            Operand::Address(addr) => Some(addr),
            Operand::Accumulator | Operand::Implied => None,
        };

        let extra_handler_cycles = (entry.handler)(self, memory, operand);
        let consumed = entry.base_cycles as u64
            + extra_addressing_cycles as u64
            + extra_handler_cycles as u64;
        self.cycles += consumed;

        if let Some(listener) = self.listener.as_mut() {
            listener.on_after_step(&InstructionTrace {
                pc_before,
                opcode,
                mnemonic: entry.mnemonic.as_str(),
                mode: entry.mode,
                operand_bytes,
                effective_address,
                cycles_consumed: consumed,
                cycles_total: self.cycles,
                a: self.regs.a_u8(),
                x: self.regs.x_u8(),
                y: self.regs.y_u8(),
                sp: self.regs.sp,
                p: self.regs.p,
            });
        }

        Cycles(consumed)
    }

    /// Sets `pc` to `start`, clears the stop-request flag and halt
    /// reason, then steps until the core halts or a stop-request is
    /// observed. The stop-request is checked after each step completes,
    /// so a listener calling `request_stop()` mid-instruction takes
    /// effect once that instruction finishes. Returns the number of
    /// instructions executed.
    pub fn execute_from(&mut self, memory: &mut dyn Memory, start: Addr) -> u64 {
        self.regs.pc = start.0 as u16;
        self.stop_requested = false;
        self.halt = HaltState::Running;

        let mut executed = 0u64;
        loop {
            self.step(memory);
            executed += 1;
            if self.halt != HaltState::Running || self.stop_requested {
                break;
            }
        }
        executed
    }

    fn service_interrupt(&mut self, memory: &mut dyn Memory, vector: Addr, is_brk: bool) -> u64 {
        log::debug!(
            "vectoring through {:#06x} (software_break={is_brk})",
            vector.0
        );
        self.push_u16(memory, self.regs.pc);
        let pushed = self.regs.p.to_pushed_byte(is_brk);
        self.push_u8(memory, pushed);
        self.regs.p.set_flag(ProcessorStatus::IRQ_DISABLE, true);
        self.regs.p.set_flag(ProcessorStatus::DECIMAL, false);
        self.regs.pc = memory.read_word(vector);
        7
    }

    fn fetch_u8(&mut self, memory: &mut dyn Memory) -> u8 {
        let value = memory.read(self.regs.pc_addr());
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn push_u8(&mut self, memory: &mut dyn Memory, value: u8) {
        let addr = Addr::from(STACK_PAGE + self.regs.sp as u16);
        memory.write(addr, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    fn pull_u8(&mut self, memory: &mut dyn Memory) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let addr = Addr::from(STACK_PAGE + self.regs.sp as u16);
        memory.read(addr)
    }

    fn push_u16(&mut self, memory: &mut dyn Memory, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push_u8(memory, hi);
        self.push_u8(memory, lo);
    }

    fn pull_u16(&mut self, memory: &mut dyn Memory) -> u16 {
        let lo = self.pull_u8(memory);
        let hi = self.pull_u8(memory);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn brk(&mut self, memory: &mut dyn Memory) -> u64 {
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.service_interrupt(memory, vectors::IRQ_BRK, true)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    #[test]
    fn reset_loads_pc_from_vector_and_preserves_cycles() {
        let mut mem = FlatMemory::new(0x10000);
        mem.write_word(Addr(0xFFFC), 0x8000);
        let mut cpu = Cpu::new();
        cpu.cycles = Cycles(42);
        cpu.reset(&mut mem);
        assert_eq!(cpu.regs.pc, 0x8000);
        assert_eq!(cpu.cycles, Cycles(42));
    }

    #[test]
    fn lda_immediate_sets_accumulator_and_flags() {
        let mut mem = FlatMemory::new(0x10000);
        mem.write_word(Addr(0xFFFC), 0x0200);
        mem.write(Addr(0x0200), 0xA9); // LDA #imm
        mem.write(Addr(0x0201), 0x00);
        let mut cpu = Cpu::new();
        cpu.reset(&mut mem);
        let cycles = cpu.step(&mut mem);
        assert_eq!(cpu.regs.a_u8(), 0x00);
        assert!(cpu.regs.p.contains(ProcessorStatus::ZERO));
        assert_eq!(cycles, Cycles(2));
        assert_eq!(cpu.regs.pc, 0x0202);
    }

    #[test]
    fn stp_halts_and_wai_resumes_on_irq() {
        let mut mem = FlatMemory::new(0x10000);
        mem.write_word(Addr(0xFFFC), 0x0300);
        mem.write(Addr(0x0300), 0xCB); // WAI
        let mut cpu = Cpu::new();
        cpu.reset(&mut mem);
        cpu.step(&mut mem);
        assert_eq!(cpu.halt_state(), HaltState::WaitingForInterrupt);
        cpu.signal_irq();
        cpu.step(&mut mem);
        assert_eq!(cpu.halt_state(), HaltState::Running);
    }
}
