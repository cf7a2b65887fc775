//! Register block of the SSD accelerator.
//!
//! The accelerator front end is four 32-bit PIO ports on the processor bus.
//! Each port sits at its own base; the default offsets below assume the
//! ports were generated contiguously with the usual 16-byte PIO stride
//! inside one bridge window.
//!
//! ```text
//! Offset  Port         Dir  Contents
//! ──────  ───────────  ───  ─────────────────────────────────────────────
//! 0x00    CONTROL      W    [7:4] template ID  [3:2] index  [1] READY  [0] START
//! 0x10    DATA_IN      W    sample, sign-extended to 32 bits
//! 0x20    STATUS       R    [0] DONE
//! 0x30    RESULT_OUT   R    SSD distance, valid while DONE is set
//! ```

// ── Default offsets ──────────────────────────────────────────────────────────

/// Control port offset.
pub const CONTROL: usize = 0x00;
/// Data-in port offset.
pub const DATA_IN: usize = 0x10;
/// Status port offset.
pub const STATUS: usize = 0x20;
/// Result-out port offset.
pub const RESULT_OUT: usize = 0x30;

/// Bytes spanned by the default register block.
pub const BLOCK_SPAN: usize = RESULT_OUT + 4;

/// Width of every port in bytes.
pub const REGISTER_WIDTH: usize = 4;

// ── Bit definitions ──────────────────────────────────────────────────────────

/// Control register bit definitions.
pub mod control {
    /// Start pulse. Must be observed high then low to begin a run.
    pub const START: u32 = 1 << 0;
    /// Sample-valid pulse. Data-in is latched on its rising edge.
    pub const DATA_READY: u32 = 1 << 1;
    /// Bit position of the 1-based sample index field.
    pub const INDEX_SHIFT: u32 = 2;
    /// Width of the sample index field.
    pub const INDEX_WIDTH: u32 = 2;
    /// Bit position of the template ID field.
    pub const ID_SHIFT: u32 = 4;
    /// Width of the template ID field.
    pub const ID_WIDTH: u32 = 4;
}

/// Status register bit definitions.
pub mod status {
    /// Result-out holds the final distance.
    pub const DONE: u32 = 1 << 0;
}

/// One of the four accelerator ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Control word (write).
    Control,
    /// Streamed sample (write).
    DataIn,
    /// Completion flag (read).
    Status,
    /// Distance (read).
    ResultOut,
}

impl Register {
    /// All ports, in offset order.
    pub const ALL: [Self; 4] = [Self::Control, Self::DataIn, Self::Status, Self::ResultOut];

    /// Default offset of this port inside the register block.
    #[must_use]
    pub const fn default_offset(self) -> usize {
        match self {
            Self::Control => CONTROL,
            Self::DataIn => DATA_IN,
            Self::Status => STATUS,
            Self::ResultOut => RESULT_OUT,
        }
    }

    /// Whether the driver writes this port (as opposed to reading it).
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::Control | Self::DataIn)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Control => "CONTROL",
            Self::DataIn => "DATA_IN",
            Self::Status => "STATUS",
            Self::ResultOut => "RESULT_OUT",
        })
    }
}
