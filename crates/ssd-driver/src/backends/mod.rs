//! Register backend implementations
//!
//! Two backends available:
//! - **MMIO**: the real accelerator behind a mapped bridge window (root, FPGA configured)
//! - **Simulated**: in-memory model of the accelerator, traces every access (CI, protocol tests)

pub mod mmio;
pub mod simulated;

pub use mmio::{MmioBus, MmioWindow};
pub use simulated::{BusEvent, Completion, ProtocolViolation, SimulatedAccelerator};
