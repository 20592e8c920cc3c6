//! Debug introspection hooks (§4.6).
//!
//! The teacher has no listener abstraction of its own — `cpu-visualizer`
//! and `nes-frontend` poll `Cpu6502`'s public fields directly from an
//! external render loop. spec.md §4.6 instead asks for a push-based
//! before/after-step hook that costs nothing when no listener is
//! attached, which is the same zero-cost-when-absent shape `Option<Box<dyn
//! Trait>>` gives any Rust crate exposing an optional extension point; the
//! steering mechanism itself has no direct analogue in the corpus, so it
//! is built from first principles against spec.md rather than adapted
//! from a specific file, and noted as such in DESIGN.md.

use crate::cpu::addressing::Mode;
use crate::flags::ProcessorStatus;
use crate::types::{Addr, Cycles};

/// A snapshot of one fetch-decode-execute step, handed to a
/// [`DebugListener`] after the instruction has fully executed.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionTrace {
    pub pc_before: Addr,
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub mode: Mode,
    pub operand_bytes: Vec<u8>,
    /// The resolved effective address, or `None` for `Implied`/
    /// `Accumulator` addressing, which touch no memory location.
    pub effective_address: Option<Addr>,
    pub cycles_consumed: u64,
    pub cycles_total: Cycles,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: ProcessorStatus,
}

/// An optional observer attached via `Cpu::attach_debugger`.
///
/// `on_before_step` fires after fetch but before the opcode's side
/// effects are applied; `on_after_step` fires once the instruction and
/// its cycle accounting are complete. Neither hook is allowed to mutate
/// CPU state — they receive read-only snapshots.
pub trait DebugListener {
    fn on_before_step(&mut self, pc: Addr, opcode: u8) {
        let _ = (pc, opcode);
    }

    fn on_after_step(&mut self, trace: &InstructionTrace) {
        let _ = trace;
    }
}

/// A listener that records every trace it receives, useful for tests and
/// for the disassembly/execution-agreement property in spec.md §8.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub traces: Vec<InstructionTrace>,
}

impl DebugListener for RecordingListener {
    fn on_after_step(&mut self, trace: &InstructionTrace) {
        self.traces.push(trace.clone());
    }
}
