//! Register backend abstraction
//!
//! The handshake only needs four 32-bit ports. Anything that can read and
//! write them (a mapped bridge window or an in-memory model of the
//! accelerator) can stand behind the link.

use crate::backends::{MmioBus, SimulatedAccelerator};
use crate::config::ClassifierConfig;
use crate::error::Result;
use ssd_chip::Register;
use std::fmt::Debug;

/// Access to the accelerator's register block.
///
/// Implementations must perform every access in call order, without
/// caching or coalescing: control pulses are consecutive writes of the same
/// port and each one is observable by the hardware.
pub trait RegisterBus: Debug {
    /// Read a 32-bit port.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be accessed.
    fn read32(&mut self, reg: Register) -> Result<u32>;

    /// Write a 32-bit port.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be accessed.
    fn write32(&mut self, reg: Register, value: u32) -> Result<()>;

    /// Get backend type for debugging
    fn backend_type(&self) -> BackendType;
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read32(&mut self, reg: Register) -> Result<u32> {
        (**self).read32(reg)
    }

    fn write32(&mut self, reg: Register, value: u32) -> Result<()> {
        (**self).write32(reg, value)
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read32(&mut self, reg: Register) -> Result<u32> {
        (**self).read32(reg)
    }

    fn write32(&mut self, reg: Register, value: u32) -> Result<()> {
        (**self).write32(reg, value)
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Memory-mapped bridge window (real accelerator)
    Mmio,

    /// In-memory accelerator model, no hardware required
    Simulated,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mmio => write!(f, "MMIO"),
            Self::Simulated => write!(f, "Simulated"),
        }
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Use the mapped accelerator if the config names a device and its
    /// window opens, else the model
    Auto,

    /// Force the memory-mapped accelerator
    Mmio,

    /// Force the in-memory model
    Simulated,
}

/// Open the register backend described by `config`.
///
/// The simulated backend's ROM is loaded from the configured template table,
/// so both paths compare against the same data.
///
/// # Errors
///
/// Returns error if the requested backend cannot be opened.
pub fn select_backend(
    selection: BackendSelection,
    config: &ClassifierConfig,
) -> Result<Box<dyn RegisterBus>> {
    let simulated = || {
        Box::new(SimulatedAccelerator::new(
            config.templates().clone(),
            config.layout(),
        )) as Box<dyn RegisterBus>
    };

    match selection {
        BackendSelection::Auto if config.accelerator().device.is_none() => {
            tracing::info!("No accelerator device configured, using simulated accelerator");
            Ok(simulated())
        }

        BackendSelection::Auto => match MmioBus::open(config.accelerator()) {
            Ok(bus) => {
                tracing::info!(
                    "Using MMIO backend at {:#x} via {}",
                    config.accelerator().base,
                    config.accelerator().device_path().display()
                );
                Ok(Box::new(bus))
            }
            Err(e) => {
                tracing::info!("MMIO unavailable ({e}), using simulated accelerator");
                Ok(simulated())
            }
        },

        BackendSelection::Mmio => {
            MmioBus::open(config.accelerator()).map(|b| Box::new(b) as Box<dyn RegisterBus>)
        }

        BackendSelection::Simulated => Ok(simulated()),
    }
}
