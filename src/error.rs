//! Crate error taxonomy.
//!
//! The teacher's workspace is a binary-first project and mostly threads
//! `String`s or panics for its handful of fallible paths. The broader
//! retrieval pack's 6502-family libraries reach for `thiserror` instead
//! once they expose a library seam (`other_examples` manifests for
//! `Hashim-K-NES-Emulator`), which is the shape this crate needs for
//! `attach_debugger`/`disassemble_range`/profile-name validation per
//! spec.md §7.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpuError {
    #[error("debug listener slot is already occupied; call detach_debugger first")]
    DebuggerAlreadyAttached,

    #[error("no debug listener is currently attached")]
    NoDebuggerAttached,

    #[error("disassemble_range requires end > start (start={start}, end={end})")]
    InvalidRange { start: u32, end: u32 },

    #[error("invalid machine profile name {name:?}: {reason}")]
    InvalidProfileName { name: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
